//! COFF object layout for a `.rsrc` section.
//!
//! The object holds a single section followed by its relocations, one
//! symbol and an empty string table:
//!
//! ```text
//! file header         20 bytes
//! section header      40 bytes
//! .rsrc               directory tree (depth first), data entries, data blobs
//! relocations         10 bytes per data entry, ADDR32NB against symbol 0
//! symbol table        18 bytes: ".rsrc", section 1
//! string table        4 bytes: its own length
//! ```
//!
//! The resource directory has three levels: type, ID, language. Every offset
//! inside the section is relative to the section start; subdirectory offsets
//! carry the high bit. Data entry RVAs are section-relative as well and get
//! the section's final address added by the linker through the relocations.

use crate::bundler::error::{Error, Result};
use crate::bundler::resources::binutil::{Blob, Encode};
use crate::bundler::settings::Arch;
use crate::encode_fields;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Section and symbol name.
const RSRC_NAME: [u8; 8] = *b".rsrc\0\0\0";

/// `IMAGE_FILE_32BIT_MACHINE | IMAGE_FILE_LINE_NUMS_STRIPPED`, as windres emits.
const FILE_CHARACTERISTICS: u16 = 0x0104;

/// `IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ`.
const SECTION_CHARACTERISTICS: u32 = 0x4000_0040;

/// `IMAGE_SYM_CLASS_STATIC`.
const SYMBOL_CLASS_STATIC: u8 = 3;

/// High bit of a directory entry offset: the entry points at a subdirectory.
pub const SUBDIRECTORY: u32 = 0x8000_0000;

/// Language every resource is registered under (en-US).
pub const LANG_EN_US: u32 = 0x0409;

/// Alignment of data blobs within the section.
const DATA_ALIGN: usize = 8;

const FILE_HEADER_LEN: u32 = 20;
const SECTION_HEADER_LEN: u32 = 40;
const DATA_ENTRY_LEN: u32 = 16;

/// Target machine of the object, with its section-relative relocation type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Machine {
    I386,
    Amd64,
    ArmNt,
    Arm64,
}

impl Machine {
    /// Maps a build architecture to its COFF machine.
    pub fn for_arch(arch: Arch) -> Result<Self> {
        match arch {
            Arch::X86 => Ok(Machine::I386),
            Arch::Amd64 => Ok(Machine::Amd64),
            Arch::Arm => Ok(Machine::ArmNt),
            Arch::Arm64 => Ok(Machine::Arm64),
            other => Err(Error::ArchError(other.to_string())),
        }
    }

    /// `IMAGE_FILE_MACHINE_*` value.
    pub fn id(&self) -> u16 {
        match self {
            Machine::I386 => 0x014c,
            Machine::Amd64 => 0x8664,
            Machine::ArmNt => 0x01c4,
            Machine::Arm64 => 0xaa64,
        }
    }

    /// `IMAGE_REL_*_ADDR32NB` (`DIR32NB` on i386) for this machine.
    pub fn addr32nb(&self) -> u16 {
        match self {
            Machine::I386 => 0x0007,
            Machine::Amd64 => 0x0003,
            Machine::ArmNt | Machine::Arm64 => 0x0002,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FileHeader {
    pub machine: u16,
    pub number_of_sections: u16,
    pub time_date_stamp: u32,
    pub pointer_to_symbol_table: u32,
    pub number_of_symbols: u32,
    pub size_of_optional_header: u16,
    pub characteristics: u16,
}

encode_fields!(FileHeader {
    machine,
    number_of_sections,
    time_date_stamp,
    pointer_to_symbol_table,
    number_of_symbols,
    size_of_optional_header,
    characteristics,
});

#[derive(Clone, Debug, Default)]
pub struct SectionHeader {
    pub name: [u8; 8],
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
    pub pointer_to_relocations: u32,
    pub pointer_to_line_numbers: u32,
    pub number_of_relocations: u16,
    pub number_of_line_numbers: u16,
    pub characteristics: u32,
}

encode_fields!(SectionHeader {
    name,
    virtual_size,
    virtual_address,
    size_of_raw_data,
    pointer_to_raw_data,
    pointer_to_relocations,
    pointer_to_line_numbers,
    number_of_relocations,
    number_of_line_numbers,
    characteristics,
});

/// IMAGE_RESOURCE_DIRECTORY.
#[derive(Clone, Debug, Default)]
pub struct DirHeader {
    pub characteristics: u32,
    pub time_date_stamp: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub number_of_named_entries: u16,
    pub number_of_id_entries: u16,
}

encode_fields!(DirHeader {
    characteristics,
    time_date_stamp,
    major_version,
    minor_version,
    number_of_named_entries,
    number_of_id_entries,
});

/// IMAGE_RESOURCE_DIRECTORY_ENTRY.
#[derive(Clone, Debug, Default)]
pub struct DirEntry {
    pub name_or_id: u32,
    pub offset: u32,
}

encode_fields!(DirEntry { name_or_id, offset });

/// One directory with its entries and, for inner levels, one subdirectory per entry.
#[derive(Clone, Debug, Default)]
pub struct Dir {
    pub header: DirHeader,
    pub entries: Vec<DirEntry>,
    pub subdirs: Vec<Dir>,
}

encode_fields!(Dir {
    header,
    entries,
    subdirs
});

impl Dir {
    fn with_ids(ids: impl IntoIterator<Item = u32>) -> Result<Self> {
        let entries: Vec<DirEntry> = ids
            .into_iter()
            .map(|name_or_id| DirEntry {
                name_or_id,
                offset: 0,
            })
            .collect();
        Ok(Self {
            header: DirHeader {
                number_of_id_entries: u16::try_from(entries.len())?,
                ..Default::default()
            },
            entries,
            subdirs: Vec::new(),
        })
    }

    /// Points every inner entry at its subdirectory and every leaf entry at
    /// the next data entry, walking in serialization order.
    fn assign_offsets(&mut self, cursor: &mut u32, next_leaf: &mut u32) {
        *cursor += (self.header.encoded_len() + self.entries.encoded_len()) as u32;
        if self.subdirs.is_empty() {
            for entry in &mut self.entries {
                entry.offset = *next_leaf;
                *next_leaf += DATA_ENTRY_LEN;
            }
            return;
        }
        for (entry, subdir) in self.entries.iter_mut().zip(&mut self.subdirs) {
            entry.offset = SUBDIRECTORY | *cursor;
            subdir.assign_offsets(cursor, next_leaf);
        }
    }
}

/// IMAGE_RESOURCE_DATA_ENTRY.
#[derive(Clone, Debug, Default)]
pub struct DataEntry {
    pub offset_to_data: u32,
    pub size: u32,
    pub code_page: u32,
    pub reserved: u32,
}

encode_fields!(DataEntry {
    offset_to_data,
    size,
    code_page,
    reserved
});

#[derive(Clone, Debug, Default)]
pub struct Relocation {
    pub virtual_address: u32,
    pub symbol_table_index: u32,
    pub kind: u16,
}

encode_fields!(Relocation {
    virtual_address,
    symbol_table_index,
    kind
});

#[derive(Clone, Debug, Default)]
pub struct Symbol {
    pub name: [u8; 8],
    pub value: u32,
    pub section_number: u16,
    pub kind: u16,
    pub storage_class: u8,
    pub aux_count: u8,
}

encode_fields!(Symbol {
    name,
    value,
    section_number,
    kind,
    storage_class,
    aux_count,
});

/// A complete resource object, ready to encode.
#[derive(Clone, Debug)]
pub struct Coff {
    pub file_header: FileHeader,
    pub section: SectionHeader,
    pub root: Dir,
    pub data_entries: Vec<DataEntry>,
    pub data: Vec<Blob>,
    pub relocations: Vec<Relocation>,
    pub symbols: Vec<Symbol>,
    pub string_table_len: u32,
}

encode_fields!(Coff {
    file_header,
    section,
    root,
    data_entries,
    data,
    relocations,
    symbols,
    string_table_len,
});

/// Resources keyed by type, then ID. Iteration order is the on-disk order.
pub type ResourceMap = BTreeMap<u32, BTreeMap<u16, Bytes>>;

impl Coff {
    /// Lays out `resources` as a `.rsrc` object for `machine`.
    pub fn build(machine: Machine, resources: &ResourceMap) -> Result<Self> {
        let mut root = Dir::with_ids(resources.keys().copied())?;
        for ids in resources.values() {
            let mut by_type = Dir::with_ids(ids.keys().map(|&id| u32::from(id)))?;
            by_type.subdirs = ids
                .keys()
                .map(|_| Dir::with_ids([LANG_EN_US]))
                .collect::<Result<_>>()?;
            root.subdirs.push(by_type);
        }

        let tree_len = u32::try_from(root.encoded_len())?;
        let mut cursor = 0;
        let mut next_leaf = tree_len;
        root.assign_offsets(&mut cursor, &mut next_leaf);

        let blobs: Vec<Blob> = resources
            .values()
            .flat_map(BTreeMap::values)
            .map(|data| Blob::aligned(data.clone(), DATA_ALIGN))
            .collect();
        let leaves = u32::try_from(blobs.len())?;

        let mut data_offset = tree_len + leaves * DATA_ENTRY_LEN;
        let mut data_entries = Vec::with_capacity(blobs.len());
        for blob in &blobs {
            data_entries.push(DataEntry {
                offset_to_data: data_offset,
                size: u32::try_from(blob.len())?,
                ..Default::default()
            });
            data_offset += u32::try_from(blob.encoded_len())?;
        }

        let relocations: Vec<Relocation> = (0..leaves)
            .map(|index| Relocation {
                virtual_address: tree_len + index * DATA_ENTRY_LEN,
                symbol_table_index: 0,
                kind: machine.addr32nb(),
            })
            .collect();

        let raw_start = FILE_HEADER_LEN + SECTION_HEADER_LEN;
        let relocations_start = raw_start + data_offset;
        let symbols_start = relocations_start + u32::try_from(relocations.encoded_len())?;

        Ok(Self {
            file_header: FileHeader {
                machine: machine.id(),
                number_of_sections: 1,
                pointer_to_symbol_table: symbols_start,
                number_of_symbols: 1,
                characteristics: FILE_CHARACTERISTICS,
                ..Default::default()
            },
            section: SectionHeader {
                name: RSRC_NAME,
                size_of_raw_data: data_offset,
                pointer_to_raw_data: raw_start,
                pointer_to_relocations: relocations_start,
                number_of_relocations: u16::try_from(relocations.len())?,
                characteristics: SECTION_CHARACTERISTICS,
                ..Default::default()
            },
            root,
            data_entries,
            data: blobs,
            relocations,
            symbols: vec![Symbol {
                name: RSRC_NAME,
                section_number: 1,
                storage_class: SYMBOL_CLASS_STATIC,
                ..Default::default()
            }],
            string_table_len: 4,
        })
    }
}
