use regex::bytes::Regex;
use serde::Serialize;
use std::{
    collections::HashSet,
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};
use thiserror::Error;

/// Little-endian magic stored in the last four bytes of a pak.
pub const PAK_MAGIC: u32 = 0x5A6F_12E1;
pub const DEFAULT_SIZE_CEILING: u64 = 1024 * 1024 * 1024;
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["uasset", "umap", "uexp"];

const FOOTER_WINDOW: u64 = 256;
const MAGIC_LEN: usize = 4;
// Field positions are counted back from the start of the magic (footer v11).
const VERSION_BACK: usize = 33;
const INDEX_OFFSET_BACK: usize = 29;
const INDEX_SIZE_BACK: usize = 21;
const MOUNT_POINT_WINDOW: usize = 128;
const LEN_PREFIX: usize = 4;

/// Lower-cased asset paths in the order the index lists them, without repeats.
pub type AssetPaths = Vec<String>;

#[derive(Debug, Error)]
pub enum PakError {
    #[error("read pak: {0}")]
    Io(#[from] io::Error),
    #[error("pak is {size} bytes, above the {ceiling} byte scan ceiling")]
    Oversize { size: u64, ceiling: u64 },
    #[error("index at {offset}+{size} runs past the end of a {len} byte file")]
    IndexOutOfRange { offset: u64, size: u64, len: u64 },
    #[error("asset pattern needs at least one extension")]
    NoExtensions,
    #[error("build asset pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PakInfo {
    pub version: i32,
    pub index_offset: u64,
    pub index_size: u64,
    pub mount_point: String,
}

/// Matches `<content root><path chars>.<ext>` inside raw index bytes.
#[derive(Debug, Clone)]
pub struct AssetPattern {
    regex: Regex,
}

impl AssetPattern {
    pub fn new<S: AsRef<str>>(content_root: &str, extensions: &[S]) -> Result<Self, PakError> {
        let extensions: Vec<String> = extensions
            .iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .map(regex::escape)
            .collect();
        if extensions.is_empty() {
            return Err(PakError::NoExtensions);
        }
        let pattern = format!(
            r"(?i-u){}[A-Za-z0-9_./-]+\.(?:{})",
            regex::escape(content_root),
            extensions.join("|")
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }

    pub fn find_all(&self, blob: &[u8]) -> AssetPaths {
        let mut seen = HashSet::new();
        self.regex
            .find_iter(blob)
            .map(|found| String::from_utf8_lossy(found.as_bytes()).to_ascii_lowercase())
            .filter(|asset| seen.insert(asset.clone()))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub pattern: AssetPattern,
    pub size_ceiling: u64,
}

impl ScanOptions {
    pub fn new(pattern: AssetPattern) -> Self {
        Self {
            pattern,
            size_ceiling: DEFAULT_SIZE_CEILING,
        }
    }

    pub fn with_size_ceiling(mut self, size_ceiling: u64) -> Self {
        self.size_ceiling = size_ceiling;
        self
    }
}

pub struct PakReader<R> {
    inner: R,
    len: u64,
}

impl PakReader<File> {
    pub fn open(path: &Path) -> Result<Self, PakError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self::new(file, len))
    }
}

impl<R: Read + Seek> PakReader<R> {
    pub fn new(inner: R, len: u64) -> Self {
        Self { inner, len }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Decodes the trailing footer. `Ok(None)` means this is not a pak we understand.
    pub fn info(&mut self) -> Result<Option<PakInfo>, PakError> {
        let window = self.len.min(FOOTER_WINDOW) as usize;
        if window < MAGIC_LEN + VERSION_BACK {
            return Ok(None);
        }
        let mut footer = vec![0u8; window];
        self.read_exact_at(self.len - window as u64, &mut footer)?;

        let magic_at = window - MAGIC_LEN;
        if u32::from_le_bytes(le_bytes(&footer, magic_at)) != PAK_MAGIC {
            return Ok(None);
        }

        let version = i32::from_le_bytes(le_bytes(&footer, magic_at - VERSION_BACK));
        let index_offset = u64::from_le_bytes(le_bytes(&footer, magic_at - INDEX_OFFSET_BACK));
        let index_size = u64::from_le_bytes(le_bytes(&footer, magic_at - INDEX_SIZE_BACK));
        let in_range = index_offset
            .checked_add(index_size)
            .is_some_and(|end| end <= self.len);
        if !in_range {
            return Err(PakError::IndexOutOfRange {
                offset: index_offset,
                size: index_size,
                len: self.len,
            });
        }

        let mut head = [0u8; MOUNT_POINT_WINDOW];
        let read = self.read_at(index_offset, &mut head)?;
        let mount_point = decode_mount_point(&head[..read]);

        Ok(Some(PakInfo {
            version,
            index_offset,
            index_size,
            mount_point,
        }))
    }

    /// Scans the index block for asset paths. Oversized files are rejected before any read.
    pub fn asset_paths(&mut self, options: &ScanOptions) -> Result<AssetPaths, PakError> {
        if self.len > options.size_ceiling {
            return Err(PakError::Oversize {
                size: self.len,
                ceiling: options.size_ceiling,
            });
        }
        let Some(info) = self.info()? else {
            return Ok(AssetPaths::new());
        };

        let size = usize::try_from(info.index_size).map_err(|_| PakError::Oversize {
            size: info.index_size,
            ceiling: options.size_ceiling,
        })?;
        let mut index = vec![0u8; size];
        self.read_exact_at(info.index_offset, &mut index)?;
        Ok(options.pattern.find_all(&index))
    }

    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(buf)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(filled)
    }
}

fn le_bytes<const N: usize>(buf: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[at..at + N]);
    out
}

fn decode_mount_point(head: &[u8]) -> String {
    if head.len() < LEN_PREFIX {
        return String::new();
    }
    let declared = i32::from_le_bytes(le_bytes(head, 0));
    let Ok(declared) = usize::try_from(declared) else {
        return String::new();
    };
    if declared == 0 || LEN_PREFIX + declared > head.len() {
        return String::new();
    }
    String::from_utf8_lossy(&head[LEN_PREFIX..LEN_PREFIX + declared]).replace('\0', "")
}

/// Anything that can report the asset paths shipped by one mod file.
pub trait AssetSource {
    fn asset_paths(&self, path: &Path) -> AssetPaths;
}

pub struct PakScanner {
    options: ScanOptions,
}

impl PakScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }
}

impl AssetSource for PakScanner {
    fn asset_paths(&self, path: &Path) -> AssetPaths {
        let result =
            PakReader::open(path).and_then(|mut reader| reader.asset_paths(&self.options));
        match result {
            Ok(assets) => {
                log::debug!("{}: {} asset path(s)", path.display(), assets.len());
                assets
            }
            Err(err @ PakError::Oversize { .. }) => {
                log::info!("Skipping large pak {}: {err}", path.display());
                AssetPaths::new()
            }
            Err(err) => {
                log::warn!("Failed to read pak {}: {err}", path.display());
                AssetPaths::new()
            }
        }
    }
}

pub fn read_pak_info(path: &Path) -> Option<PakInfo> {
    match PakReader::open(path).and_then(|mut reader| reader.info()) {
        Ok(info) => {
            if info.is_none() {
                log::debug!("{}: pak magic not found", path.display());
            }
            info
        }
        Err(err) => {
            log::warn!("Failed to read pak footer {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    /// Builds a minimal pak: payload, index (mount point + body), padded footer.
    pub(crate) fn build_pak(mount_point: &str, index_body: &[u8]) -> Vec<u8> {
        let mut data = b"\x00\x01payload\xfe\xff".to_vec();
        let index_offset = data.len() as u64;

        let mut index = Vec::new();
        let mount = format!("{mount_point}\0");
        index.extend_from_slice(&(mount.len() as i32).to_le_bytes());
        index.extend_from_slice(mount.as_bytes());
        index.extend_from_slice(index_body);
        let index_size = index.len() as u64;
        data.extend_from_slice(&index);

        data.extend_from_slice(&[0u8; 40]);
        data.extend_from_slice(&11i32.to_le_bytes());
        data.extend_from_slice(&index_offset.to_le_bytes());
        data.extend_from_slice(&index_size.to_le_bytes());
        data.extend_from_slice(&[0u8; 13]);
        data.extend_from_slice(&PAK_MAGIC.to_le_bytes());
        data
    }

    fn palworld_options() -> ScanOptions {
        ScanOptions::new(AssetPattern::new("/Pal/Content/", &DEFAULT_EXTENSIONS).unwrap())
    }

    fn reader(bytes: Vec<u8>) -> PakReader<Cursor<Vec<u8>>> {
        let len = bytes.len() as u64;
        PakReader::new(Cursor::new(bytes), len)
    }

    #[derive(Default)]
    struct CountingSource {
        reads: usize,
        seeks: usize,
    }

    impl Read for CountingSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            buf.fill(0);
            Ok(buf.len())
        }
    }

    impl Seek for CountingSource {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            self.seeks += 1;
            Ok(0)
        }
    }

    #[test]
    fn info_decodes_footer_and_mount_point() {
        let bytes = build_pak("../../../", b"\x00/Pal/Content/A.uasset\x00");
        let info = reader(bytes).info().unwrap().unwrap();
        assert_eq!(info.version, 11);
        assert_eq!(info.index_offset, 11);
        assert_eq!(info.mount_point, "../../../");
        assert_eq!(info.index_size, 4 + 10 + 23);
    }

    #[test]
    fn wrong_magic_is_not_a_pak() {
        let mut bytes = build_pak("../../../", b"/Pal/Content/A.uasset");
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let mut pak = reader(bytes);
        assert!(pak.info().unwrap().is_none());
        assert!(pak.asset_paths(&palworld_options()).unwrap().is_empty());
    }

    #[test]
    fn tiny_file_is_not_a_pak() {
        let mut pak = reader(PAK_MAGIC.to_le_bytes().to_vec());
        assert!(pak.info().unwrap().is_none());
    }

    #[test]
    fn asset_paths_are_lowercase_and_unique() {
        let body = b"\x01\x02/Pal/Content/Mods/Hat.uasset\x00\xff\
            /pal/content/mods/hat.UASSET\x00\
            /Pal/Content/Maps/Island.umap\x10\
            /Pal/Content/Mods/Hat.uexp\x00\
            /Pal/Content/Readme.txt\x00\
            /Other/Content/Mods/Skip.uasset";
        let assets = reader(build_pak("../../../", body))
            .asset_paths(&palworld_options())
            .unwrap();
        let expected: AssetPaths = [
            "/pal/content/mods/hat.uasset",
            "/pal/content/maps/island.umap",
            "/pal/content/mods/hat.uexp",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(assets, expected);
        assert!(assets.iter().all(|asset| *asset == asset.to_lowercase()));
    }

    #[test]
    fn asset_paths_keep_index_order() {
        let body = b"\x00/Pal/Content/Z.uasset\x00/Pal/Content/A.uasset\x00/Pal/Content/Z.uasset\x00";
        let assets = reader(build_pak("../../../", body))
            .asset_paths(&palworld_options())
            .unwrap();
        assert_eq!(assets, vec!["/pal/content/z.uasset", "/pal/content/a.uasset"]);
    }

    #[test]
    fn custom_root_matches_game_content() {
        let options = ScanOptions::new(AssetPattern::new("/Game/Content/", &["uasset"]).unwrap());
        let assets = reader(build_pak("/", b"\x00/Game/Content/foo/bar.uasset\x00"))
            .asset_paths(&options)
            .unwrap();
        assert_eq!(
            assets.into_iter().collect::<Vec<_>>(),
            vec!["/game/content/foo/bar.uasset".to_string()]
        );
    }

    #[test]
    fn bad_mount_point_length_keeps_assets() {
        let mut bytes = build_pak("../../../", b"\x00/Pal/Content/A.uasset\x00");
        bytes[11..15].copy_from_slice(&500i32.to_le_bytes());
        let mut pak = reader(bytes);
        let info = pak.info().unwrap().unwrap();
        assert_eq!(info.mount_point, "");
        assert_eq!(pak.asset_paths(&palworld_options()).unwrap().len(), 1);
    }

    #[test]
    fn negative_mount_point_length_is_empty() {
        assert_eq!(decode_mount_point(&(-4i32).to_le_bytes()), "");
        assert_eq!(decode_mount_point(&[1, 0]), "");
    }

    #[test]
    fn index_past_end_of_file_is_rejected() {
        let mut bytes = build_pak("../../../", b"/Pal/Content/A.uasset");
        let size_at = bytes.len() - 4 - INDEX_SIZE_BACK;
        bytes[size_at..size_at + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        let err = reader(bytes).info().unwrap_err();
        assert!(matches!(err, PakError::IndexOutOfRange { .. }));
    }

    #[test]
    fn oversize_pak_is_never_read() {
        let len = 2 * 1024 * 1024 * 1024u64;
        let mut pak = PakReader::new(CountingSource::default(), len);
        let err = pak.asset_paths(&palworld_options()).unwrap_err();
        assert!(matches!(err, PakError::Oversize { size, .. } if size == len));
        let source = pak.into_inner();
        assert_eq!(source.reads, 0);
        assert_eq!(source.seeks, 0);
    }

    #[test]
    fn pattern_requires_an_extension() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            AssetPattern::new("/Pal/Content/", &empty),
            Err(PakError::NoExtensions)
        ));
        assert!(matches!(
            AssetPattern::new("/Pal/Content/", &[" . "]),
            Err(PakError::NoExtensions)
        ));
    }

    #[test]
    fn scanner_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = PakScanner::new(palworld_options());
        assert!(scanner.asset_paths(&dir.path().join("missing.pak")).is_empty());

        let junk = dir.path().join("junk.pak");
        std::fs::write(&junk, vec![7u8; 512]).unwrap();
        assert!(scanner.asset_paths(&junk).is_empty());
        assert!(read_pak_info(&junk).is_none());

        let real = dir.path().join("real.pak");
        std::fs::write(&real, build_pak("../../../", b"/Pal/Content/A.uasset")).unwrap();
        assert_eq!(scanner.asset_paths(&real).len(), 1);
        assert_eq!(read_pak_info(&real).unwrap().mount_point, "../../../");

        let capped = PakScanner::new(palworld_options().with_size_ceiling(16));
        assert!(capped.asset_paths(&real).is_empty());
    }
}
