//! Minimal ISO9660 image writer.
//!
//! Produces a single-session image with a Primary Volume Descriptor, both
//! path tables and one extent per directory and file:
//!
//! ```text
//! sectors 0-15    system area (zero)
//! sector 16       primary volume descriptor
//! sector 17       volume descriptor set terminator
//! 18..            L path table, then M path table
//! ..              directory extents, breadth first
//! ..              file extents, in directory order
//! ```
//!
//! Identifiers are uppercased and reduced to d-characters (`A-Z 0-9 _`).
//! Files are recorded as `NAME.EXT;1`.

use crate::bundler::error::{Error, Result};
use bytes::Bytes;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path};

/// Logical sector and block size.
pub const SECTOR_SIZE: usize = 2048;

const PVD_SECTOR: usize = 16;
const PATH_TABLE_SECTOR: u32 = 18;
const FLAG_DIRECTORY: u8 = 0x02;
const RECORD_HEADER_LEN: usize = 33;
const MAX_DIR_IDENTIFIER: usize = 31;
const MAX_FILE_IDENTIFIER: usize = 30;
const MAX_VOLUME_IDENTIFIER: usize = 32;
const MAX_SUFFIX: u32 = 9999;

#[derive(Debug, Default)]
struct DirNode {
    entries: BTreeMap<String, Node>,
    /// Source name to the identifier it was given.
    sources: HashMap<String, String>,
}

#[derive(Debug)]
enum Node {
    Dir(DirNode),
    File(Bytes),
}

/// Collects files and serializes them as an ISO9660 image.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_pack::bundler::IsoWriter;
/// use std::path::Path;
///
/// let mut writer = IsoWriter::new();
/// writer.add_file(Path::new("App.app/Contents/Info.plist"), &b"<plist/>"[..]).unwrap();
/// let image = writer.write("App").unwrap();
/// assert_eq!(&image[16 * 2048 + 1..16 * 2048 + 6], b"CD001");
/// ```
#[derive(Debug)]
pub struct IsoWriter {
    root: DirNode,
    timestamp: DateTime<Utc>,
}

impl Default for IsoWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Placement of one directory in the image.
struct DirLayout<'a> {
    node: &'a DirNode,
    identifier: Vec<u8>,
    /// 1-based index of the parent in path table order.
    parent: usize,
    sector: u32,
    size: u32,
}

impl IsoWriter {
    /// Creates an empty image stamped with the current time.
    pub fn new() -> Self {
        Self {
            root: DirNode::default(),
            timestamp: Utc::now(),
        }
    }

    /// Stamps every descriptor and record with `timestamp`.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Adds a file at `path`, relative to the image root.
    ///
    /// Intermediate directories are created as needed. Adding a file twice
    /// replaces its contents. Distinct names that reduce to the same
    /// identifier are told apart with a numeric suffix (`MY_ICON_1.PNG;1`).
    pub fn add_file(&mut self, path: &Path, data: impl Into<Bytes>) -> Result<()> {
        let components: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let Some((file, dirs)) = components.split_last() else {
            crate::bail!("cannot add {} to image: empty path", path.display());
        };

        let mut dir = &mut self.root;
        for name in dirs {
            let identifier = match dir.sources.get(name) {
                Some(identifier) => identifier.clone(),
                None => {
                    let identifier = dir.claim(name, |n| numbered_directory_identifier(name, n))?;
                    dir.entries
                        .insert(identifier.clone(), Node::Dir(DirNode::default()));
                    identifier
                }
            };
            dir = match dir.entries.get_mut(&identifier) {
                Some(Node::Dir(subdir)) => subdir,
                _ => crate::bail!(
                    "cannot add {}: {} is already a file in the image",
                    path.display(),
                    name
                ),
            };
        }

        let data = data.into();
        match dir.sources.get(file) {
            Some(identifier) => match dir.entries.get_mut(identifier) {
                Some(Node::File(existing)) => *existing = data,
                _ => crate::bail!(
                    "cannot add {}: {} is already a directory in the image",
                    path.display(),
                    file
                ),
            },
            None => {
                let identifier = dir.claim(file, |n| numbered_file_identifier(file, n))?;
                dir.entries.insert(identifier, Node::File(data));
            }
        }
        Ok(())
    }

    /// Serializes the image with the given volume identifier.
    pub fn write(&self, volume_id: &str) -> Result<Vec<u8>> {
        let mut dirs = vec![DirLayout {
            node: &self.root,
            identifier: vec![0],
            parent: 1,
            sector: 0,
            size: 0,
        }];
        let mut children: HashMap<(usize, &str), usize> = HashMap::new();
        let mut index = 0;
        while index < dirs.len() {
            let node = dirs[index].node;
            for (name, child) in &node.entries {
                if let Node::Dir(subdir) = child {
                    children.insert((index, name.as_str()), dirs.len());
                    dirs.push(DirLayout {
                        node: subdir,
                        identifier: name.as_bytes().to_vec(),
                        parent: index + 1,
                        sector: 0,
                        size: 0,
                    });
                }
            }
            index += 1;
        }

        let path_table_len: usize = dirs
            .iter()
            .map(|d| path_record_len(&d.identifier))
            .sum();
        let path_table_sectors = sectors_for(path_table_len)?;
        let l_table = PATH_TABLE_SECTOR;
        let m_table = l_table + path_table_sectors;
        let mut next = m_table + path_table_sectors;

        for dir in &mut dirs {
            dir.size = directory_size(dir.node)?;
            dir.sector = next;
            next += dir.size / SECTOR_SIZE as u32;
        }

        let mut files: HashMap<(usize, &str), u32> = HashMap::new();
        for (index, dir) in dirs.iter().enumerate() {
            for (name, child) in &dir.node.entries {
                if let Node::File(data) = child {
                    files.insert((index, name.as_str()), next);
                    next += sectors_for(data.len())?;
                }
            }
        }

        let total = next;
        let mut image = vec![0u8; total as usize * SECTOR_SIZE];
        let stamp = record_timestamp(&self.timestamp);

        // Volume descriptors
        let root_record = directory_record(&[0], dirs[0].sector, dirs[0].size, FLAG_DIRECTORY, &stamp)?;
        let pvd = self.primary_volume_descriptor(
            volume_id,
            total,
            u32::try_from(path_table_len)?,
            l_table,
            m_table,
            &root_record,
        );
        put(&mut image, PVD_SECTOR * SECTOR_SIZE, &pvd);
        put(&mut image, (PVD_SECTOR + 1) * SECTOR_SIZE, &terminator());

        // Path tables
        let mut l_records = Vec::with_capacity(path_table_len);
        let mut m_records = Vec::with_capacity(path_table_len);
        for dir in &dirs {
            let parent = u16::try_from(dir.parent)?;
            l_records.extend(path_record(&dir.identifier, dir.sector.to_le_bytes(), parent.to_le_bytes()));
            m_records.extend(path_record(&dir.identifier, dir.sector.to_be_bytes(), parent.to_be_bytes()));
        }
        put(&mut image, l_table as usize * SECTOR_SIZE, &l_records);
        put(&mut image, m_table as usize * SECTOR_SIZE, &m_records);

        // Directories and files
        for (index, dir) in dirs.iter().enumerate() {
            let parent = &dirs[dir.parent - 1];
            let mut records = vec![
                directory_record(&[0], dir.sector, dir.size, FLAG_DIRECTORY, &stamp)?,
                directory_record(&[1], parent.sector, parent.size, FLAG_DIRECTORY, &stamp)?,
            ];
            for (name, child) in &dir.node.entries {
                let key = (index, name.as_str());
                let record = match child {
                    Node::Dir(_) => {
                        let sub = children.get(&key).map(|&i| &dirs[i]).ok_or_else(|| {
                            Error::GenericError(format!("directory {name} was not laid out"))
                        })?;
                        directory_record(name.as_bytes(), sub.sector, sub.size, FLAG_DIRECTORY, &stamp)?
                    }
                    Node::File(data) => {
                        let sector = files.get(&key).copied().ok_or_else(|| {
                            Error::GenericError(format!("file {name} was not laid out"))
                        })?;
                        put(&mut image, sector as usize * SECTOR_SIZE, data);
                        directory_record(name.as_bytes(), sector, u32::try_from(data.len())?, 0, &stamp)?
                    }
                };
                records.push(record);
            }

            let mut offset = dir.sector as usize * SECTOR_SIZE;
            let mut used = 0;
            for record in records {
                if used + record.len() > SECTOR_SIZE {
                    offset += SECTOR_SIZE - used;
                    used = 0;
                }
                put(&mut image, offset, &record);
                offset += record.len();
                used += record.len();
            }
        }

        Ok(image)
    }

    fn primary_volume_descriptor(
        &self,
        volume_id: &str,
        total_sectors: u32,
        path_table_len: u32,
        l_table: u32,
        m_table: u32,
        root_record: &[u8],
    ) -> Vec<u8> {
        let mut pvd = vec![0u8; SECTOR_SIZE];
        pvd[0] = 1;
        pvd[1..6].copy_from_slice(b"CD001");
        pvd[6] = 1;
        pvd[8..40].copy_from_slice(&space_padded("", 32));
        pvd[40..72].copy_from_slice(&space_padded(&volume_identifier(volume_id), 32));
        pvd[80..88].copy_from_slice(&both_u32(total_sectors));
        pvd[120..124].copy_from_slice(&both_u16(1));
        pvd[124..128].copy_from_slice(&both_u16(1));
        pvd[128..132].copy_from_slice(&both_u16(SECTOR_SIZE as u16));
        pvd[132..140].copy_from_slice(&both_u32(path_table_len));
        pvd[140..144].copy_from_slice(&l_table.to_le_bytes());
        pvd[148..152].copy_from_slice(&m_table.to_be_bytes());
        pvd[156..156 + root_record.len()].copy_from_slice(root_record);
        pvd[190..318].copy_from_slice(&space_padded("", 128));
        pvd[318..446].copy_from_slice(&space_padded("", 128));
        pvd[446..574].copy_from_slice(&space_padded("", 128));
        pvd[574..702].copy_from_slice(&space_padded("KODEGEN PACK", 128));
        pvd[702..813].copy_from_slice(&space_padded("", 111));
        let stamp = volume_timestamp(Some(&self.timestamp));
        pvd[813..830].copy_from_slice(&stamp);
        pvd[830..847].copy_from_slice(&stamp);
        pvd[847..864].copy_from_slice(&volume_timestamp(None));
        pvd[864..881].copy_from_slice(&volume_timestamp(None));
        pvd[881] = 1;
        pvd
    }
}

fn terminator() -> Vec<u8> {
    let mut sector = vec![0u8; SECTOR_SIZE];
    sector[0] = 255;
    sector[1..6].copy_from_slice(b"CD001");
    sector[6] = 1;
    sector
}

fn put(image: &mut [u8], offset: usize, data: &[u8]) {
    image[offset..offset + data.len()].copy_from_slice(data);
}

fn sectors_for(len: usize) -> Result<u32> {
    Ok(u32::try_from(len.div_ceil(SECTOR_SIZE))?)
}

fn both_u16(value: u16) -> [u8; 4] {
    let [a, b] = value.to_le_bytes();
    let [c, d] = value.to_be_bytes();
    [a, b, c, d]
}

fn both_u32(value: u32) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&value.to_le_bytes());
    out[4..].copy_from_slice(&value.to_be_bytes());
    out
}

fn space_padded(value: &str, len: usize) -> Vec<u8> {
    let mut out: Vec<u8> = value.bytes().take(len).collect();
    out.resize(len, b' ');
    out
}

fn record_len(identifier_len: usize) -> usize {
    RECORD_HEADER_LEN + identifier_len + (1 - identifier_len % 2)
}

fn path_record_len(identifier: &[u8]) -> usize {
    8 + identifier.len() + identifier.len() % 2
}

fn path_record(identifier: &[u8], location: [u8; 4], parent: [u8; 2]) -> Vec<u8> {
    let mut record = Vec::with_capacity(path_record_len(identifier));
    record.push(identifier.len() as u8);
    record.push(0);
    record.extend_from_slice(&location);
    record.extend_from_slice(&parent);
    record.extend_from_slice(identifier);
    if identifier.len() % 2 == 1 {
        record.push(0);
    }
    record
}

/// Size of a directory extent, with records never crossing a sector.
fn directory_size(node: &DirNode) -> Result<u32> {
    let lens = [record_len(1), record_len(1)]
        .into_iter()
        .chain(node.entries.keys().map(|name| record_len(name.len())));
    let mut sectors = 1;
    let mut used = 0;
    for len in lens {
        if used + len > SECTOR_SIZE {
            sectors += 1;
            used = 0;
        }
        used += len;
    }
    Ok(u32::try_from(sectors * SECTOR_SIZE)?)
}

fn directory_record(
    identifier: &[u8],
    sector: u32,
    size: u32,
    flags: u8,
    stamp: &[u8; 7],
) -> Result<Vec<u8>> {
    let len = record_len(identifier.len());
    let mut record = vec![0u8; len];
    record[0] = u8::try_from(len)?;
    record[2..10].copy_from_slice(&both_u32(sector));
    record[10..18].copy_from_slice(&both_u32(size));
    record[18..25].copy_from_slice(stamp);
    record[25] = flags;
    record[28..32].copy_from_slice(&both_u16(1));
    record[32] = u8::try_from(identifier.len())?;
    record[33..33 + identifier.len()].copy_from_slice(identifier);
    Ok(record)
}

fn record_timestamp(time: &DateTime<Utc>) -> [u8; 7] {
    [
        u8::try_from(time.year() - 1900).unwrap_or(0),
        time.month() as u8,
        time.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
        0,
    ]
}

/// 17-byte `dec-datetime`; `None` is the "not specified" value.
fn volume_timestamp(time: Option<&DateTime<Utc>>) -> [u8; 17] {
    let mut out = [b'0'; 17];
    out[16] = 0;
    if let Some(time) = time {
        let digits = time.format("%Y%m%d%H%M%S00").to_string();
        out[..16].copy_from_slice(&digits.as_bytes()[..16]);
    }
    out
}

fn d_characters(value: &str) -> String {
    value
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            upper @ ('A'..='Z' | '0'..='9' | '_') => upper,
            _ => '_',
        })
        .collect()
}

impl DirNode {
    /// Picks the first free identifier for `name`, trying `identifier(0)`,
    /// then `identifier(1)` and so on, and records it.
    fn claim(&mut self, name: &str, identifier: impl Fn(u32) -> String) -> Result<String> {
        for n in 0..=MAX_SUFFIX {
            let candidate = identifier(n);
            if !self.entries.contains_key(&candidate) {
                self.sources.insert(name.to_string(), candidate.clone());
                return Ok(candidate);
            }
        }
        crate::bail!("no free image identifier left for {name}")
    }
}

fn suffix(n: u32) -> String {
    if n == 0 { String::new() } else { format!("_{n}") }
}

/// Directory identifier: d-characters, at most 31 of them.
pub fn directory_identifier(name: &str) -> String {
    numbered_directory_identifier(name, 0)
}

fn numbered_directory_identifier(name: &str, n: u32) -> String {
    let suffix = suffix(n);
    let mut id = d_characters(name);
    id.truncate(MAX_DIR_IDENTIFIER - suffix.len());
    id.push_str(&suffix);
    id
}

/// File identifier: `NAME.EXT;1`, with an empty extension kept as `NAME.;1`.
pub fn file_identifier(name: &str) -> String {
    numbered_file_identifier(name, 0)
}

fn numbered_file_identifier(name: &str, n: u32) -> String {
    let suffix = suffix(n);
    let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));
    let mut ext = d_characters(ext);
    ext.truncate(MAX_FILE_IDENTIFIER - 1 - suffix.len());
    let mut stem = d_characters(stem);
    stem.truncate(MAX_FILE_IDENTIFIER - 1 - suffix.len() - ext.len());
    format!("{stem}{suffix}.{ext};1")
}

/// Volume identifier: d-characters, at most 32 of them.
pub fn volume_identifier(name: &str) -> String {
    let mut id = d_characters(name);
    id.truncate(MAX_VOLUME_IDENTIFIER);
    if id.is_empty() {
        id.push_str("UNSPECIFIED");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn u32_at(image: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(image[offset..offset + 4].try_into().expect("4 bytes"))
    }

    /// Records of the directory extent at (sector, size): (identifier, sector, size, flags).
    fn read_dir(image: &[u8], sector: u32, size: u32) -> Vec<(Vec<u8>, u32, u32, u8)> {
        let start = sector as usize * SECTOR_SIZE;
        let end = start + size as usize;
        let mut records = Vec::new();
        let mut offset = start;
        while offset < end {
            let len = image[offset] as usize;
            if len == 0 {
                offset = (offset / SECTOR_SIZE + 1) * SECTOR_SIZE;
                continue;
            }
            assert_eq!(
                offset / SECTOR_SIZE,
                (offset + len - 1) / SECTOR_SIZE,
                "record crosses a sector boundary"
            );
            let id_len = image[offset + 32] as usize;
            records.push((
                image[offset + 33..offset + 33 + id_len].to_vec(),
                u32_at(image, offset + 2),
                u32_at(image, offset + 10),
                image[offset + 25],
            ));
            offset += len;
        }
        records
    }

    fn lookup(image: &[u8], path: &[&str]) -> (u32, u32, u8) {
        let mut current = (u32_at(image, 16 * SECTOR_SIZE + 158), u32_at(image, 16 * SECTOR_SIZE + 166), FLAG_DIRECTORY);
        for name in path {
            let found = read_dir(image, current.0, current.1)
                .into_iter()
                .find(|(id, ..)| id == name.as_bytes())
                .unwrap_or_else(|| panic!("{name} not found"));
            current = (found.1, found.2, found.3);
        }
        current
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 12, 30, 45).single().expect("valid date")
    }

    #[test]
    fn descriptors_and_path_tables() {
        let mut writer = IsoWriter::new().with_timestamp(fixed_time());
        writer
            .add_file(Path::new("Hello.app/Contents/MacOS/hello"), &b"binary"[..])
            .expect("add");
        let image = writer.write("Hello").expect("write");

        assert_eq!(image.len() % SECTOR_SIZE, 0);
        assert!(image[..16 * SECTOR_SIZE].iter().all(|&b| b == 0));

        let pvd = &image[16 * SECTOR_SIZE..17 * SECTOR_SIZE];
        assert_eq!(pvd[0], 1);
        assert_eq!(&pvd[1..6], b"CD001");
        assert_eq!(&pvd[40..45], b"HELLO");
        assert_eq!(u32_at(pvd, 80) as usize, image.len() / SECTOR_SIZE);
        assert_eq!(&pvd[84..88], &((image.len() / SECTOR_SIZE) as u32).to_be_bytes());
        assert_eq!(u16::from_le_bytes([pvd[128], pvd[129]]), 2048);
        assert_eq!(&pvd[813..829], b"2024051712304500");
        assert_eq!(pvd[881], 1);

        let terminator = &image[17 * SECTOR_SIZE..18 * SECTOR_SIZE];
        assert_eq!(terminator[0], 255);
        assert_eq!(&terminator[1..6], b"CD001");

        // root, HELLO_APP, CONTENTS, MACOS
        let path_table_len = u32_at(pvd, 132) as usize;
        assert_eq!(path_table_len, 10 + 18 + 16 + 14);
        let l = u32_at(pvd, 140) as usize * SECTOR_SIZE;
        let root_sector = u32_at(pvd, 158);
        assert_eq!(image[l], 1);
        assert_eq!(u32_at(&image, l + 2), root_sector);
        assert_eq!(u16::from_le_bytes([image[l + 6], image[l + 7]]), 1);
        assert_eq!(&image[l + 18..l + 27], b"HELLO_APP");

        let m = u32::from_be_bytes(pvd[148..152].try_into().expect("4 bytes")) as usize * SECTOR_SIZE;
        assert_eq!(&image[m + 2..m + 6], &root_sector.to_be_bytes());
    }

    #[test]
    fn files_are_reachable_through_the_directory_tree() {
        let mut writer = IsoWriter::new().with_timestamp(fixed_time());
        writer
            .add_file(Path::new("Hello.app/Contents/MacOS/hello"), &b"binary"[..])
            .expect("add");
        writer
            .add_file(Path::new("Hello.app/Contents/Info.plist"), &b"<plist/>"[..])
            .expect("add");
        let image = writer.write("Hello").expect("write");

        let (dir_sector, _, flags) = lookup(&image, &["HELLO_APP", "CONTENTS"]);
        assert_eq!(flags, FLAG_DIRECTORY);
        assert!(dir_sector > 18);

        let (sector, size, flags) = lookup(&image, &["HELLO_APP", "CONTENTS", "MACOS", "HELLO.;1"]);
        assert_eq!(flags, 0);
        let start = sector as usize * SECTOR_SIZE;
        assert_eq!(&image[start..start + size as usize], b"binary");

        let (sector, size, _) = lookup(&image, &["HELLO_APP", "CONTENTS", "INFO.PLIST;1"]);
        let start = sector as usize * SECTOR_SIZE;
        assert_eq!(&image[start..start + size as usize], b"<plist/>");

        let root = lookup(&image, &[]);
        let records = read_dir(&image, root.0, root.1);
        assert_eq!(records[0].0, vec![0]);
        assert_eq!(records[1].0, vec![1]);
        assert_eq!(records[1].1, root.0);
    }

    #[test]
    fn large_directories_span_sectors_without_split_records() {
        let mut writer = IsoWriter::new().with_timestamp(fixed_time());
        for i in 0..120 {
            let name = format!("Resources/resource_file_number_{i:03}.dat");
            writer.add_file(Path::new(&name), vec![i as u8; 10]).expect("add");
        }
        let image = writer.write("big").expect("write");

        let (sector, size, _) = lookup(&image, &["RESOURCES"]);
        assert!(size as usize > SECTOR_SIZE);
        assert_eq!(size as usize % SECTOR_SIZE, 0);
        let records = read_dir(&image, sector, size);
        assert_eq!(records.len(), 122);
        let names: Vec<&Vec<u8>> = records.iter().skip(2).map(|r| &r.0).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn output_is_deterministic_for_a_fixed_time() {
        let build = || {
            let mut writer = IsoWriter::new().with_timestamp(fixed_time());
            writer.add_file(Path::new("a/b.txt"), &b"x"[..]).expect("add");
            writer.add_file(Path::new("c"), &b""[..]).expect("add");
            writer.write("vol").expect("write")
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn conflicting_paths_are_rejected() {
        let mut writer = IsoWriter::new();
        writer.add_file(Path::new("a"), &b"file"[..]).expect("add");
        assert!(writer.add_file(Path::new("a/b"), &b"nested"[..]).is_err());

        let mut writer = IsoWriter::new();
        writer.add_file(Path::new("a/b"), &b"nested"[..]).expect("add");
        assert!(writer.add_file(Path::new("a"), &b"file"[..]).is_err());

        assert!(writer.add_file(Path::new(""), &b""[..]).is_err());
    }

    #[test]
    fn names_mangled_alike_keep_their_own_contents() {
        let mut writer = IsoWriter::new().with_timestamp(fixed_time());
        writer
            .add_file(Path::new("Res/my-icon.png"), &b"dash"[..])
            .expect("add");
        writer
            .add_file(Path::new("Res/my_icon.png"), &b"underscore"[..])
            .expect("add");
        writer.add_file(Path::new("My.App/x"), &b"dotted"[..]).expect("add");
        writer.add_file(Path::new("My_App/x"), &b"plain"[..]).expect("add");
        let image = writer.write("Vol").expect("write");

        let read = |path: &[&str]| {
            let (sector, size, _) = lookup(&image, path);
            let start = sector as usize * SECTOR_SIZE;
            image[start..start + size as usize].to_vec()
        };
        assert_eq!(read(&["RES", "MY_ICON.PNG;1"]), b"dash");
        assert_eq!(read(&["RES", "MY_ICON_1.PNG;1"]), b"underscore");
        assert_eq!(read(&["MY_APP", "X.;1"]), b"dotted");
        assert_eq!(read(&["MY_APP_1", "X.;1"]), b"plain");
    }

    #[test]
    fn adding_the_same_path_twice_replaces_it() {
        let mut writer = IsoWriter::new().with_timestamp(fixed_time());
        writer.add_file(Path::new("a.txt"), &b"old"[..]).expect("add");
        writer.add_file(Path::new("a.txt"), &b"new"[..]).expect("add");
        let image = writer.write("Vol").expect("write");

        let root = lookup(&image, &[]);
        let files: Vec<_> = read_dir(&image, root.0, root.1)
            .into_iter()
            .filter(|(.., flags)| *flags == 0)
            .collect();
        assert_eq!(files.len(), 1);
        let (sector, size, _) = lookup(&image, &["A.TXT;1"]);
        let start = sector as usize * SECTOR_SIZE;
        assert_eq!(&image[start..start + size as usize], b"new");
    }

    #[test]
    fn identifier_mangling() {
        assert_eq!(file_identifier("Info.plist"), "INFO.PLIST;1");
        assert_eq!(file_identifier("hello"), "HELLO.;1");
        assert_eq!(file_identifier("my-app.v2.icns"), "MY_APP_V2.ICNS;1");
        assert_eq!(directory_identifier("Hello.app"), "HELLO_APP");
        assert_eq!(directory_identifier(&"x".repeat(40)).len(), 31);
        assert!(file_identifier(&format!("{}.dat", "n".repeat(40))).len() <= 32);
        assert_eq!(numbered_file_identifier("my-icon.png", 1), "MY_ICON_1.PNG;1");
        assert!(numbered_file_identifier(&"n".repeat(40), 9999).len() <= 32);
        assert_eq!(numbered_directory_identifier(&"x".repeat(40), 2).len(), 31);
        assert_eq!(volume_identifier(""), "UNSPECIFIED");
        assert_eq!(volume_identifier("My App"), "MY_APP");
    }
}
