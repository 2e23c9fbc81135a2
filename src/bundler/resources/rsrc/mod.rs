//! Windows resource embedding.
//!
//! Builds a COFF object (`.syso`) carrying an icon group and, optionally, an
//! application manifest. Placed in a package directory, the object is linked
//! into the Windows executable automatically.
//!
//! Icon images are not re-encoded: each `RT_ICON` resource is the payload
//! slice of the source ICO, and the `RT_GROUP_ICON` body repeats the ICO
//! directory with file offsets replaced by resource IDs.

pub mod coff;

use super::binutil::Encode;
use super::ico::{ICO_TYPE_ICON, IcoDir, IcoHeader, IconEntryCommon};
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::settings::Arch;
use crate::encode_fields;
use bytes::Bytes;
use coff::{Coff, Machine, ResourceMap};
use std::path::Path;

/// Resource type of one icon image.
pub const RT_ICON: u32 = 3;
/// Resource type of an icon group.
pub const RT_GROUP_ICON: u32 = 14;
/// Resource type of an application manifest.
pub const RT_MANIFEST: u32 = 24;

/// ID an application manifest is registered under.
pub const MANIFEST_ID: u16 = 1;

/// Hands out resource IDs for one embedding run, starting at 1.
#[derive(Debug, Default)]
pub struct IdGenerator(u16);

impl IdGenerator {
    /// Creates a generator whose first ID is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unused ID, or an error once all 65535 are taken.
    pub fn next_id(&mut self) -> Result<u16> {
        self.0 = self
            .0
            .checked_add(1)
            .ok_or_else(|| Error::InvalidIco("too many images for resource ids".into()))?;
        Ok(self.0)
    }
}

/// GRPICONDIRENTRY: an icon directory entry addressed by resource ID.
#[derive(Clone, Copy, Debug, Default)]
struct GroupEntry {
    common: IconEntryCommon,
    id: u16,
}

encode_fields!(GroupEntry { common, id });

struct IconGroup {
    header: IcoHeader,
    entries: Vec<GroupEntry>,
}

encode_fields!(IconGroup { header, entries });

/// Builds the resource object for `arch` from an ICO file and an optional manifest.
///
/// # Errors
///
/// - [`Error::InvalidIco`](crate::bundler::Error::InvalidIco) if the ICO directory is malformed
/// - [`Error::ArchError`](crate::bundler::Error::ArchError) if `arch` has no COFF machine type
pub fn embed(ico: Option<&[u8]>, manifest: Option<&[u8]>, arch: Arch) -> Result<Vec<u8>> {
    let machine = Machine::for_arch(arch)?;
    let mut resources = ResourceMap::new();
    let mut ids = IdGenerator::new();

    if let Some(ico) = ico {
        add_icon(&mut resources, ico, &mut ids)?;
    }
    if let Some(manifest) = manifest {
        resources
            .entry(RT_MANIFEST)
            .or_default()
            .insert(MANIFEST_ID, Bytes::copy_from_slice(manifest));
    }

    Ok(Coff::build(machine, &resources)?.to_bytes())
}

fn add_icon(resources: &mut ResourceMap, ico: &[u8], ids: &mut IdGenerator) -> Result<()> {
    let dir = IcoDir::parse(ico)?;
    if dir.entries.is_empty() {
        return Ok(());
    }

    let mut group = IconGroup {
        header: IcoHeader {
            reserved: 0,
            kind: ICO_TYPE_ICON,
            count: dir.header.count,
        },
        entries: Vec::with_capacity(dir.entries.len()),
    };
    for (index, entry) in dir.entries.iter().enumerate() {
        let id = ids.next_id()?;
        let image = Bytes::copy_from_slice(dir.image_data(ico, index)?);
        resources.entry(RT_ICON).or_default().insert(id, image);
        group.entries.push(GroupEntry {
            common: entry.common,
            id,
        });
    }

    resources
        .entry(RT_GROUP_ICON)
        .or_default()
        .insert(ids.next_id()?, Bytes::from(group.to_bytes()));
    Ok(())
}

/// File name of the resource object for `arch`.
///
/// The `_windows_<arch>` suffix restricts the object to that build target.
pub fn syso_file_name(arch: Arch) -> String {
    format!("rsrc_windows_{arch}.syso")
}

/// Builds the resource object and writes it to `output`.
pub async fn write_syso(
    output: &Path,
    ico: Option<&[u8]>,
    manifest: Option<&[u8]>,
    arch: Arch,
) -> Result<()> {
    let object = embed(ico, manifest, arch)?;
    tokio::fs::write(output, object)
        .await
        .fs_context("writing resource object", output)?;
    log::debug!("Wrote resource object {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::resources::binutil::Reader;
    use crate::bundler::resources::{ico, icons::sample_icon};

    /// (type, id, data) triples read back through the directory tree.
    fn read_resources(object: &[u8]) -> Vec<(u32, u32, Vec<u8>)> {
        let section = goblin::pe::Coff::parse(object).expect("coff").sections[0].clone();
        let start = section.pointer_to_raw_data as usize;
        let raw = &object[start..start + section.size_of_raw_data as usize];

        let entries = |offset: u32| -> Vec<(u32, u32)> {
            let mut r = Reader::new(&raw[offset as usize..]);
            r.take(12).expect("header");
            let named = r.u16().expect("named");
            let ids = r.u16().expect("ids");
            (0..named + ids)
                .map(|_| (r.u32().expect("id"), r.u32().expect("offset")))
                .collect()
        };

        let mut found = Vec::new();
        for (kind, types_off) in entries(0) {
            assert_ne!(types_off & coff::SUBDIRECTORY, 0);
            for (id, ids_off) in entries(types_off & !coff::SUBDIRECTORY) {
                let langs = entries(ids_off & !coff::SUBDIRECTORY);
                assert_eq!(langs.len(), 1);
                let (lang, leaf) = langs[0];
                assert_eq!(lang, coff::LANG_EN_US);
                assert_eq!(leaf & coff::SUBDIRECTORY, 0);

                let mut r = Reader::new(&raw[leaf as usize..]);
                let rva = r.u32().expect("rva") as usize;
                let size = r.u32().expect("size") as usize;
                found.push((kind, id, raw[rva..rva + size].to_vec()));
            }
        }
        found
    }

    #[test]
    fn ids_increase_from_one_and_group_counts_icons() {
        let data = ico::encode(&sample_icon(64)).expect("ico");
        let object = embed(Some(&data), None, Arch::Amd64).expect("embed");
        let resources = read_resources(&object);

        let icon_ids: Vec<u32> = resources
            .iter()
            .filter(|(kind, _, _)| *kind == RT_ICON)
            .map(|(_, id, _)| *id)
            .collect();
        assert_eq!(icon_ids, [1, 2, 3, 4, 5, 6]);

        let groups: Vec<_> = resources.iter().filter(|r| r.0 == RT_GROUP_ICON).collect();
        assert_eq!(groups.len(), 1);
        let (_, group_id, body) = groups[0];
        assert_eq!(*group_id, 7);

        let mut r = Reader::new(body);
        assert_eq!(r.u16(), Some(0));
        assert_eq!(r.u16(), Some(1));
        assert_eq!(r.u16(), Some(icon_ids.len() as u16));
        assert_eq!(body.len(), 6 + 14 * icon_ids.len());
        for expected in &icon_ids {
            r.take(12).expect("common fields");
            assert_eq!(r.u16().map(u32::from), Some(*expected));
        }
    }

    #[test]
    fn icon_resources_are_the_original_payload_slices() {
        let data = ico::encode(&sample_icon(32)).expect("ico");
        let dir = IcoDir::parse(&data).expect("dir");
        let object = embed(Some(&data), None, Arch::X86).expect("embed");

        let icons: Vec<Vec<u8>> = read_resources(&object)
            .into_iter()
            .filter(|(kind, _, _)| *kind == RT_ICON)
            .map(|(_, _, body)| body)
            .collect();
        for (index, body) in icons.iter().enumerate() {
            assert_eq!(body.as_slice(), dir.image_data(&data, index).expect("slice"));
        }
    }

    #[test]
    fn object_header_and_relocations() {
        let data = ico::encode(&sample_icon(16)).expect("ico");
        let object = embed(Some(&data), Some(b"<assembly/>"), Arch::Arm64).expect("embed");

        let parsed = goblin::pe::Coff::parse(&object).expect("coff");
        assert_eq!(parsed.header.machine, 0xaa64);
        assert_eq!(parsed.header.number_of_sections, 1);
        let section = &parsed.sections[0];
        assert_eq!(section.name().expect("name"), ".rsrc");
        assert_eq!(section.pointer_to_raw_data, 60);
        assert_eq!(section.characteristics, 0x4000_0040);
        assert_eq!(section.number_of_relocations, 8);

        let relocations: Vec<_> = section.relocations(&object).expect("relocations").collect();
        assert_eq!(relocations.len(), 8);
        assert!(relocations.iter().all(|r| r.typ == 2 && r.symbol_table_index == 0));

        let manifest: Vec<_> = read_resources(&object)
            .into_iter()
            .filter(|(kind, _, _)| *kind == RT_MANIFEST)
            .collect();
        assert_eq!(manifest, vec![(RT_MANIFEST, 1, b"<assembly/>".to_vec())]);
    }

    #[test]
    fn each_run_starts_ids_afresh() {
        let data = ico::encode(&sample_icon(16)).expect("ico");
        let first = embed(Some(&data), None, Arch::Amd64).expect("embed");
        let second = embed(Some(&data), None, Arch::Amd64).expect("embed");
        assert_eq!(first, second);
    }

    #[test]
    fn ids_run_out_instead_of_wrapping() {
        let mut ids = IdGenerator(u16::MAX - 1);
        assert_eq!(ids.next_id().expect("last id"), u16::MAX);
        assert!(matches!(ids.next_id(), Err(Error::InvalidIco(_))));
        assert!(ids.next_id().is_err());
    }

    #[test]
    fn wasm_has_no_machine() {
        assert!(embed(None, Some(b"m"), Arch::Wasm).is_err());
    }

    #[test]
    fn syso_names_carry_the_arch() {
        assert_eq!(syso_file_name(Arch::X86), "rsrc_windows_386.syso");
        assert_eq!(syso_file_name(Arch::Arm64), "rsrc_windows_arm64.syso");
    }
}
