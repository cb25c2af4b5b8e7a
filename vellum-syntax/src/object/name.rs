//! Names and the table of well-known names.

use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

#[derive(Clone)]
enum Repr {
    Known(u16),
    Dynamic(Rc<[u8]>),
}

/// A PDF name.
///
/// Names that appear in the well-known table are stored as a small index and
/// never allocate. All other names are reference counted.
#[derive(Clone)]
pub struct Name(Repr);

impl Name {
    /// Create a new name from its unescaped bytes, interning it if it's well-known.
    pub fn new(data: &[u8]) -> Name {
        match lookup(data) {
            Some(idx) => Name(Repr::Known(idx)),
            None => Name(Repr::Dynamic(Rc::from(data))),
        }
    }

    pub(crate) const fn known(idx: u16) -> Name {
        Name(Repr::Known(idx))
    }

    /// Return the unescaped bytes of the name.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Repr::Known(idx) => TABLE[*idx as usize],
            Repr::Dynamic(data) => data,
        }
    }

    /// Return a string representation of the name.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("{non-utf8 name}")
    }

    /// Whether the name is stored in the table of well-known names.
    pub fn is_well_known(&self) -> bool {
        matches!(self.0, Repr::Known(_))
    }

    /// The index of the name in the table of well-known names.
    pub fn well_known_index(&self) -> Option<u16> {
        match self.0 {
            Repr::Known(idx) => Some(idx),
            Repr::Dynamic(_) => None,
        }
    }

    pub(crate) fn refs(&self) -> usize {
        match &self.0 {
            Repr::Known(_) => 0,
            Repr::Dynamic(data) => Rc::strong_count(data),
        }
    }
}

fn lookup(data: &[u8]) -> Option<u16> {
    TABLE.binary_search(&data).ok().map(|idx| idx as u16)
}

impl Deref for Name {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Name {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Repr::Known(a), Repr::Known(b)) => a == b,
            // A dynamic name can never hold the text of a well-known one.
            (Repr::Known(_), Repr::Dynamic(_)) | (Repr::Dynamic(_), Repr::Known(_)) => false,
            (Repr::Dynamic(a), Repr::Dynamic(b)) => a == b,
        }
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            // The table is sorted, so the index order is the byte order.
            (Repr::Known(a), Repr::Known(b)) => a.cmp(b),
            _ => self.as_bytes().cmp(other.as_bytes()),
        }
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl From<&[u8]> for Name {
    fn from(value: &[u8]) -> Self {
        Name::new(value)
    }
}

impl<const N: usize> From<&[u8; N]> for Name {
    fn from(value: &[u8; N]) -> Self {
        Name::new(value)
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value.as_bytes())
    }
}

impl From<&Name> for Name {
    fn from(value: &Name) -> Self {
        value.clone()
    }
}

macro_rules! well_known {
    ($($konst:ident => $text:literal),* $(,)?) => {
        #[allow(non_camel_case_types, clippy::upper_case_acronyms, dead_code)]
        #[repr(u16)]
        enum Index {
            $($konst),*
        }

        // Must stay sorted by bytes, lookups use binary search.
        static TABLE: &[&[u8]] = &[$($text),*];

        /// The table of well-known names.
        #[allow(missing_docs)]
        pub mod names {
            use super::{Index, Name};

            $(pub const $konst: Name = Name::known(Index::$konst as u16);)*
        }
    };
}

well_known! {
    A => b"A",
    AA => b"AA",
    AP => b"AP",
    AS => b"AS",
    ACRO_FORM => b"AcroForm",
    ALTERNATE => b"Alternate",
    ANNOT => b"Annot",
    ANNOTS => b"Annots",
    ASCENT => b"Ascent",
    AUTHOR => b"Author",
    BBOX => b"BBox",
    BASE_ENCODING => b"BaseEncoding",
    BASE_FONT => b"BaseFont",
    BITS_PER_COMPONENT => b"BitsPerComponent",
    BORDER => b"Border",
    C => b"C",
    CA => b"CA",
    CIDSYSTEMINFO => b"CIDSystemInfo",
    CID_TO_GID_MAP => b"CIDToGIDMap",
    CAP_HEIGHT => b"CapHeight",
    CATALOG => b"Catalog",
    CH => b"Ch",
    CHAR_PROCS => b"CharProcs",
    COLORSPACE => b"ColorSpace",
    COLORS => b"Colors",
    COLUMNS => b"Columns",
    CONTENTS => b"Contents",
    COUNT => b"Count",
    CREATION_DATE => b"CreationDate",
    CREATOR => b"Creator",
    CROP_BOX => b"CropBox",
    D => b"D",
    DA => b"DA",
    DCT_DECODE => b"DCTDecode",
    DR => b"DR",
    DV => b"DV",
    DW => b"DW",
    DECODE => b"Decode",
    DECODE_PARMS => b"DecodeParms",
    DESCENDANT_FONTS => b"DescendantFonts",
    DESCENT => b"Descent",
    DEST => b"Dest",
    DESTS => b"Dests",
    DEVICE_CMYK => b"DeviceCMYK",
    DEVICE_GRAY => b"DeviceGray",
    DEVICE_RGB => b"DeviceRGB",
    DIFFERENCES => b"Differences",
    EF => b"EF",
    EMBEDDED_FILE => b"EmbeddedFile",
    EMBEDDED_FILES => b"EmbeddedFiles",
    ENCODING => b"Encoding",
    ENCRYPT => b"Encrypt",
    EXT_G_STATE => b"ExtGState",
    F => b"F",
    FT => b"FT",
    FF => b"Ff",
    FIELDS => b"Fields",
    FILTER => b"Filter",
    FIRST => b"First",
    FIRST_CHAR => b"FirstChar",
    FLAGS => b"Flags",
    FLATE_DECODE => b"FlateDecode",
    FONT => b"Font",
    FONT_BBOX => b"FontBBox",
    FONT_DESC => b"FontDescriptor",
    FONT_FILE => b"FontFile",
    FONT_FILE2 => b"FontFile2",
    FONT_FILE3 => b"FontFile3",
    FONT_MATRIX => b"FontMatrix",
    FONT_NAME => b"FontName",
    FORM => b"Form",
    FUNCTION_TYPE => b"FunctionType",
    FUNCTIONS => b"Functions",
    GROUP => b"Group",
    HEIGHT => b"Height",
    ICC_BASED => b"ICCBased",
    ID => b"ID",
    IDENTITY => b"Identity",
    IDENTITY_H => b"Identity-H",
    IMAGE => b"Image",
    IMAGE_B => b"ImageB",
    IMAGE_C => b"ImageC",
    IMAGE_I => b"ImageI",
    IMAGE_MASK => b"ImageMask",
    INDEX => b"Index",
    INDEXED => b"Indexed",
    INFO => b"Info",
    INTERPOLATE => b"Interpolate",
    JAVA_SCRIPT => b"JavaScript",
    K => b"K",
    KEYWORDS => b"Keywords",
    KIDS => b"Kids",
    LANG => b"Lang",
    LAST => b"Last",
    LAST_CHAR => b"LastChar",
    LENGTH => b"Length",
    LENGTH1 => b"Length1",
    LENGTH2 => b"Length2",
    LENGTH3 => b"Length3",
    LIMITS => b"Limits",
    MK => b"MK",
    MARK_INFO => b"MarkInfo",
    MASK => b"Mask",
    MATRIX => b"Matrix",
    MEDIA_BOX => b"MediaBox",
    METADATA => b"Metadata",
    MOD_DATE => b"ModDate",
    N => b"N",
    NAME => b"Name",
    NAMES => b"Names",
    NEXT => b"Next",
    NUMS => b"Nums",
    OC => b"OC",
    OCPROPERTIES => b"OCProperties",
    OBJ_STM => b"ObjStm",
    OPEN_ACTION => b"OpenAction",
    OPT => b"Opt",
    ORDERING => b"Ordering",
    OUTLINES => b"Outlines",
    P => b"P",
    PDF => b"PDF",
    PAGE => b"Page",
    PAGE_LABELS => b"PageLabels",
    PAGE_MODE => b"PageMode",
    PAGES => b"Pages",
    PARENT => b"Parent",
    PARENT_TREE => b"ParentTree",
    PATTERN => b"Pattern",
    PREV => b"Prev",
    PROC_SET => b"ProcSet",
    PRODUCER => b"Producer",
    PROPERTIES => b"Properties",
    Q => b"Q",
    R => b"R",
    RANGE => b"Range",
    RECT => b"Rect",
    REGISTRY => b"Registry",
    RESOURCES => b"Resources",
    ROOT => b"Root",
    ROTATE => b"Rotate",
    S => b"S",
    SMASK => b"SMask",
    SHADING => b"Shading",
    SIZE => b"Size",
    STEM_V => b"StemV",
    STRUCT_PARENT => b"StructParent",
    STRUCT_PARENTS => b"StructParents",
    STRUCT_TREE_ROOT => b"StructTreeRoot",
    SUBJECT => b"Subject",
    SUBTYPE => b"Subtype",
    SUPPLEMENT => b"Supplement",
    T => b"T",
    TEXT => b"Text",
    TITLE => b"Title",
    TO_UNICODE => b"ToUnicode",
    TRIM_BOX => b"TrimBox",
    TRUE_TYPE => b"TrueType",
    TYPE => b"Type",
    TYPE0 => b"Type0",
    TYPE1 => b"Type1",
    TYPE3 => b"Type3",
    U => b"U",
    URI => b"URI",
    V => b"V",
    VERSION => b"Version",
    W => b"W",
    WIDGET => b"Widget",
    WIDTH => b"Width",
    WIDTHS => b"Widths",
    XOBJECT => b"XObject",
    XREF => b"XRef",
    XREF_STM => b"XRefStm",
    NULL => b"null",
}
