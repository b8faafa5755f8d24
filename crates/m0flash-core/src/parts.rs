//! Part descriptor tables for the MSPM0 L and G families
//!
//! Identification is a two-level match: the DID part number selects a family,
//! then `(USERID.part, USERID.variant)` selects the exact orderable part.
//! The tables are sorted by `(part, variant)` so lookup can bisect.
//!
//! Sources: MSPM0L1346 datasheet table 8-13 and MSPM0G3506 datasheet
//! table 8-20.

/// One orderable silicon variant
#[derive(Debug, Clone, Copy)]
pub struct PartInfo {
    /// Full orderable part name, e.g. "MSPM0G3507SRGZR"
    pub name: &'static str,
    /// USERID part field
    pub part: u16,
    /// USERID variant field
    pub variant: u8,
}

/// A device family, keyed by the DID part number
#[derive(Debug, Clone, Copy)]
pub struct FamilyInfo {
    /// Family name, used as a fallback when the exact part is unknown
    pub name: &'static str,
    /// DID part number identifying the family
    pub part_num: u16,
    /// Member parts, sorted by `(part, variant)`
    pub parts: &'static [PartInfo],
}

impl FamilyInfo {
    /// Exact-match lookup of a part within this family
    pub fn find_part(&self, part: u16, variant: u8) -> Option<&'static PartInfo> {
        self.parts
            .binary_search_by_key(&(part, variant), |p| (p.part, p.variant))
            .ok()
            .map(|idx| &self.parts[idx])
    }
}

/// Look up a family by its DID part number
pub fn find_family(part_num: u16) -> Option<&'static FamilyInfo> {
    FAMILIES.iter().find(|f| f.part_num == part_num)
}

/// All supported families
pub static FAMILIES: [FamilyInfo; 2] = [
    FamilyInfo {
        name: "MSPM0L",
        part_num: 0xbb82,
        parts: &MSPM0L_PARTS,
    },
    FamilyInfo {
        name: "MSPM0G",
        part_num: 0xbb88,
        parts: &MSPM0G_PARTS,
    },
];

const fn part(name: &'static str, part: u16, variant: u8) -> PartInfo {
    PartInfo {
        name,
        part,
        variant,
    }
}

static MSPM0L_PARTS: [PartInfo; 58] = [
    part("MSPM0L1303SRGER", 0x0ef0, 0x17),
    part("MSPM0L1303TRGER", 0x0ef0, 0xe2),
    part("MSPM0L1344TDGS20R", 0x40b0, 0xd0),
    part("MSPM0L1305SRHBR", 0x4d03, 0x2d),
    part("MSPM0L1305SDGS28R", 0x4d03, 0x64),
    part("MSPM0L1305SRGER", 0x4d03, 0x73),
    part("MSPM0L1305QDGS28R", 0x4d03, 0x74),
    part("MSPM0L1305QRHBR", 0x4d03, 0x78),
    part("MSPM0L1305TRHBR", 0x4d03, 0x85),
    part("MSPM0L1305SDYYR", 0x4d03, 0x91),
    part("MSPM0L1305TDGS20R", 0x4d03, 0xa0),
    part("MSPM0L1305QDGS20R", 0x4d03, 0xb7),
    part("MSPM0L1305SDGS20R", 0x4d03, 0xc7),
    part("MSPM0L1305TDYYR", 0x4d03, 0xde),
    part("MSPM0L1305TRGER", 0x4d03, 0xea),
    part("MSPM0L1305QDYYR", 0x4d03, 0xec),
    part("MSPM0L1305TDGS28R", 0x4d03, 0xfb),
    part("MSPM0L1105TDGS20R", 0x51db, 0x16),
    part("MSPM0L1105TDYYR", 0x51db, 0x54),
    part("MSPM0L1105TRHBR", 0x51db, 0x68),
    part("MSPM0L1105TDGS28R", 0x51db, 0x83),
    part("MSPM0L1105TRGER", 0x51db, 0x86),
    part("MSPM0L1106TDGS20R", 0x5552, 0x4b),
    part("MSPM0L1106TRHBR", 0x5552, 0x53),
    part("MSPM0L1106TRGER", 0x5552, 0x90),
    part("MSPM0L1106TDGS28R", 0x5552, 0x98),
    part("MSPM0L1106TDYYR", 0x5552, 0x9d),
    part("MSPM0L1345TDGS28R", 0x98b4, 0x74),
    part("MSPM0L1343TDGS20R", 0xb231, 0x2e),
    part("MSPM0L1306SDGS28R", 0xbb70, 0x05),
    part("MSPM0L1306TDGS20R", 0xbb70, 0x0a),
    part("MSPM0L1306SDYYR", 0xbb70, 0x0e),
    part("MSPM0L1306TDYYR", 0xbb70, 0x35),
    part("MSPM0L1306SRHBR", 0xbb70, 0x3c),
    part("MSPM0L1306TRHBR", 0xbb70, 0x52),
    part("MSPM0L1306QDGS20R", 0xbb70, 0x59),
    part("MSPM0L1306TDGS28R", 0xbb70, 0x63),
    part("MSPM0L1306SRGER", 0xbb70, 0x7f),
    part("MSPM0L1306QDYYR", 0xbb70, 0x9f),
    part("MSPM0L1306TRGER", 0xbb70, 0xaa),
    part("MSPM0L1306QRHBR", 0xbb70, 0xc2),
    part("MSPM0L1306SDGS20R", 0xbb70, 0xf4),
    part("MSPM0L1306QDGS28R", 0xbb70, 0xf7),
    part("MSPM0L1304SRGER", 0xd717, 0x26),
    part("MSPM0L1304TDGS20R", 0xd717, 0x33),
    part("MSPM0L1304TRHBR", 0xd717, 0x5a),
    part("MSPM0L1304SDGS28R", 0xd717, 0x73),
    part("MSPM0L1304QDGS20R", 0xd717, 0x91),
    part("MSPM0L1304QDYYR", 0xd717, 0xa0),
    part("MSPM0L1304TDGS28R", 0xd717, 0xa8),
    part("MSPM0L1304QRHBR", 0xd717, 0xa9),
    part("MSPM0L1304QDGS28R", 0xd717, 0xb6),
    part("MSPM0L1304SDYYR", 0xd717, 0xb7),
    part("MSPM0L1304TRGER", 0xd717, 0xb7),
    part("MSPM0L1304SRHBR", 0xd717, 0xe4),
    part("MSPM0L1304TDYYR", 0xd717, 0xf9),
    part("MSPM0L1304SDGS20R", 0xd717, 0xfa),
    part("MSPM0L1346TDGS28R", 0xf2b5, 0xef),
];

static MSPM0G_PARTS: [PartInfo; 53] = [
    part("MSPM0G1505SRHBR", 0x13c4, 0x30),
    part("MSPM0G1505SRGZR", 0x13c4, 0x34),
    part("MSPM0G1505SPTR", 0x13c4, 0x3e),
    part("MSPM0G1505SRGER", 0x13c4, 0x47),
    part("MSPM0G1505SPMR", 0x13c4, 0x53),
    part("MSPM0G1505SDGS28R", 0x13c4, 0x73),
    part("MSPM0G3506SDGS28R", 0x151f, 0x08),
    part("MSPM0G3506SPTR", 0x151f, 0x39),
    part("MSPM0G3506SRHBR", 0x151f, 0xb5),
    part("MSPM0G3506SPMR", 0x151f, 0xd4),
    part("MSPM0G3506SRGZR", 0x151f, 0xfe),
    part("MSPM0G1507SRHBR", 0x2655, 0x4d),
    part("MSPM0G1507SDGS28R", 0x2655, 0x6d),
    part("MSPM0G1507SRGER", 0x2655, 0x83),
    part("MSPM0G1507SPMR", 0x2655, 0x97),
    part("MSPM0G1507SRGZR", 0x2655, 0xd3),
    part("MSPM0G3105SDGS20R", 0x4749, 0x21),
    part("MSPM0G3105SRHBR", 0x4749, 0xbe),
    part("MSPM0G3105SDGS28R", 0x4749, 0xdd),
    part("MSPM0G1106TRHBR", 0x477b, 0x00),
    part("MSPM0G1106TPTR", 0x477b, 0x71),
    part("MSPM0G1106TRGZR", 0x477b, 0xbb),
    part("MSPM0G1106TPMR", 0x477b, 0xd4),
    part("MSPM0G3106SRHBR", 0x54c7, 0x67),
    part("MSPM0G3106SDGS28R", 0x54c7, 0xb9),
    part("MSPM0G3106SDGS20R", 0x54c7, 0xd2),
    part("MSPM0G1506SDGS28R", 0x5ae0, 0x3a),
    part("MSPM0G1506SRHBR", 0x5ae0, 0x57),
    part("MSPM0G1506SRGER", 0x5ae0, 0x67),
    part("MSPM0G1506SRGZR", 0x5ae0, 0x75),
    part("MSPM0G1506SPMR", 0x5ae0, 0xf6),
    part("MSPM0G1107TRGZR", 0x807b, 0x20),
    part("MSPM0G1107TPTR", 0x807b, 0x32),
    part("MSPM0G1107TRGER", 0x807b, 0x79),
    part("MSPM0G1107TDGS28R", 0x807b, 0x82),
    part("MSPM0G1107TPMR", 0x807b, 0xb3),
    part("MSPM0G1107TRHBR", 0x807b, 0xbc),
    part("MSPM0G1105TPTR", 0x8934, 0x0d),
    part("MSPM0G1105TRGZR", 0x8934, 0xfe),
    part("MSPM0G3107SDGS20R", 0xab39, 0x5c),
    part("MSPM0G3107SRHBR", 0xab39, 0xb7),
    part("MSPM0G3107SDGS28R", 0xab39, 0xcc),
    part("MSPM0G3507SPTR", 0xae2d, 0x3f),
    part("MSPM0G3507SRHBR", 0xae2d, 0x4c),
    part("MSPM0G3507SPMR", 0xae2d, 0xc7),
    part("MSPM0G3507SDGS28R", 0xae2d, 0xca),
    part("MSPM0G3507SRGZR", 0xae2d, 0xf7),
    part("MSPM0G3505SPMR", 0xc504, 0x1d),
    part("MSPM0G3505SDGS28R", 0xc504, 0x8e),
    part("MSPM0G3505SPTR", 0xc504, 0x93),
    part("MSPM0G3505SRGZR", 0xc504, 0xc7),
    part("MSPM0G3505TDGS28R", 0xc504, 0xdf),
    part("MSPM0G3505SRHBR", 0xc504, 0xe7),
];
