//! Class path index over directories, `.jar` and `.jmod` archives.
//!
//! Entries are indexed by internal name when the class path is built;
//! class bytes are only read and parsed on lookup. Earlier entries shadow
//! later ones.

use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::error::ClasspathError;
use crate::reader::ClassFile;

/// One element of the class path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClasspathEntry {
    ClassDir(PathBuf),
    Jar(PathBuf),
    Jmod(PathBuf),
}

impl ClasspathEntry {
    /// Classify a path by its extension; anything that is not an archive
    /// is treated as a class directory.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match path.extension().and_then(OsStr::to_str) {
            Some("jar") | Some("zip") => ClasspathEntry::Jar(path),
            Some("jmod") => ClasspathEntry::Jmod(path),
            _ => ClasspathEntry::ClassDir(path),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ClasspathEntry::ClassDir(p) | ClasspathEntry::Jar(p) | ClasspathEntry::Jmod(p) => p,
        }
    }
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Archive { entry: usize, name: String },
}

/// Lazily-loading class path.
#[derive(Debug, Clone, Default)]
pub struct Classpath {
    entries: Vec<ClasspathEntry>,
    index: FxHashMap<String, Location>,
}

impl Classpath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every entry. Missing paths are skipped with a warning.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(entries: impl IntoIterator<Item = ClasspathEntry>) -> Result<Self, ClasspathError> {
        let mut classpath = Self::new();
        for entry in entries {
            classpath.add(entry)?;
        }
        Ok(classpath)
    }

    pub fn add(&mut self, entry: ClasspathEntry) -> Result<(), ClasspathError> {
        if !entry.path().exists() {
            tracing::warn!(path = %entry.path().display(), "class path entry does not exist");
            return Ok(());
        }
        let before = self.index.len();
        let id = self.entries.len();
        match &entry {
            ClasspathEntry::ClassDir(dir) => self.index_dir(dir),
            ClasspathEntry::Jar(path) => self.index_zip(id, path, "")?,
            ClasspathEntry::Jmod(path) => self.index_zip(id, path, "classes/")?,
        }
        tracing::debug!(
            path = %entry.path().display(),
            classes = self.index.len() - before,
            "indexed class path entry"
        );
        self.entries.push(entry);
        Ok(())
    }

    fn index_dir(&mut self, dir: &Path) {
        for entry in walkdir::WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() || entry.path().extension() != Some(OsStr::new("class")) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(dir) else { continue };
            let internal = relative
                .with_extension("")
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            self.index
                .entry(internal)
                .or_insert_with(|| Location::File(entry.path().to_path_buf()));
        }
    }

    fn index_zip(&mut self, id: usize, path: &Path, prefix: &str) -> Result<(), ClasspathError> {
        let archive = zip::ZipArchive::new(File::open(path)?)?;
        for name in archive.file_names() {
            let Some(internal) = name.strip_prefix(prefix).and_then(|n| n.strip_suffix(".class")) else {
                continue;
            };
            if internal.starts_with("META-INF/") || internal.ends_with("module-info") {
                continue;
            }
            self.index.entry(internal.to_string()).or_insert_with(|| Location::Archive {
                entry: id,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub fn contains(&self, internal_name: &str) -> bool {
        self.index.contains_key(internal_name)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Read and parse a class by internal name.
    pub fn load(&self, internal_name: &str) -> Result<Option<ClassFile>, ClasspathError> {
        let Some(location) = self.index.get(internal_name) else {
            return Ok(None);
        };
        let bytes = match location {
            Location::File(path) => std::fs::read(path)?,
            Location::Archive { entry, name } => {
                let path = self.entries[*entry].path();
                let mut archive = zip::ZipArchive::new(File::open(path)?)?;
                let mut file = archive.by_name(name)?;
                let mut bytes = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut bytes)?;
                bytes
            }
        };
        let class = ClassFile::parse(&bytes).map_err(|source| ClasspathError::ClassFile {
            class: internal_name.to_string(),
            source,
        })?;
        tracing::trace!(class = internal_name, "loaded class from class path");
        Ok(Some(class))
    }
}
