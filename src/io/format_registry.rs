// Copyright @yucwang 2026

use std::fmt;
use std::path::{ Path, PathBuf };

use super::obj_utils::{ ObjLoadError, ObjSceneReader, ObjSceneWriter };
use super::scene_xml::XmlSceneReader;
use super::scene_xml_writer::XmlSceneWriter;
use crate::core::scene::{ FormatVersion, Scene };

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
    UnsupportedFormat(PathBuf),
    InvalidVersion { file: FormatVersion, supported: FormatVersion },
    Password,
    Obj(ObjLoadError),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Io(err)
    }
}

impl From<ObjLoadError> for ImportError {
    fn from(err: ObjLoadError) -> Self {
        ImportError::Obj(err)
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "io error: {}", err),
            ImportError::Parse(msg) => write!(f, "parse error: {}", msg),
            ImportError::MissingField(field) => write!(f, "missing field: {}", field),
            ImportError::UnsupportedFormat(path) => write!(f, "no reader for {}", path.display()),
            ImportError::InvalidVersion { file, supported } =>
                write!(f, "file version {} is newer than supported version {}", file, supported),
            ImportError::Password => write!(f, "wrong or missing password"),
            ImportError::Obj(err) => write!(f, "obj load failed: {}", err),
        }
    }
}

impl std::error::Error for ImportError {}

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Encode(String),
    UnsupportedFormat,
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(err) => write!(f, "io error: {}", err),
            ExportError::Encode(msg) => write!(f, "encoding error: {}", msg),
            ExportError::UnsupportedFormat => write!(f, "no writer available"),
        }
    }
}

impl std::error::Error for ExportError {}

/// Import options shared by every reader of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct IoSettings {
    pub password: Option<String>,
    pub import_tangents: bool,
    pub import_binormals: bool,
}

impl Default for IoSettings {
    fn default() -> Self {
        Self { password: None, import_tangents: true, import_binormals: true }
    }
}

pub trait SceneReader {
    fn description(&self) -> &str;
    fn extension(&self) -> &str;
    fn read(&self, path: &Path, settings: &IoSettings) -> Result<Scene, ImportError>;
}

/// Writers render the whole file in memory; the caller decides when it
/// touches the disk.
pub trait SceneWriter {
    fn description(&self) -> &str;
    fn extension(&self) -> &str;
    fn is_native(&self) -> bool;
    fn write(&self, scene: &Scene) -> Result<Vec<u8>, ExportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub description: String,
    pub extension: String,
}

impl FileFilter {
    pub fn pattern(&self) -> String {
        format!("*.{}", self.extension)
    }
}

impl fmt::Display for FileFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.description, self.pattern())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FormatSelector {
    /// Native writer, or its ascii variant when media is not embedded.
    Native,
    Index(usize),
}

impl FormatSelector {
    pub fn from_index(index: i64) -> Self {
        if index < 0 {
            FormatSelector::Native
        } else {
            FormatSelector::Index(index as usize)
        }
    }
}

impl Default for FormatSelector {
    fn default() -> Self {
        FormatSelector::Native
    }
}

pub struct FormatRegistry {
    readers: Vec<Box<dyn SceneReader>>,
    writers: Vec<Box<dyn SceneWriter>>,
    native_writer: usize,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_builtin_formats()
    }
}

impl FormatRegistry {
    pub fn empty() -> Self {
        Self { readers: Vec::new(), writers: Vec::new(), native_writer: 0 }
    }

    pub fn with_builtin_formats() -> Self {
        let mut registry = Self::empty();
        registry.register_reader(Box::new(XmlSceneReader));
        registry.register_reader(Box::new(ObjSceneReader));
        registry.register_writer(Box::new(XmlSceneWriter::compact()));
        registry.register_writer(Box::new(XmlSceneWriter::ascii()));
        registry.register_writer(Box::new(ObjSceneWriter));
        registry.native_writer = 0;
        registry
    }

    pub fn register_reader(&mut self, reader: Box<dyn SceneReader>) -> usize {
        self.readers.push(reader);
        self.readers.len() - 1
    }

    pub fn register_writer(&mut self, writer: Box<dyn SceneWriter>) -> usize {
        self.writers.push(writer);
        self.writers.len() - 1
    }

    pub fn set_native_writer(&mut self, index: usize) {
        self.native_writer = index;
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    pub fn writer_count(&self) -> usize {
        self.writers.len()
    }

    pub fn writer(&self, index: usize) -> Option<&dyn SceneWriter> {
        self.writers.get(index).map(|w| w.as_ref())
    }

    pub fn native_writer_format(&self) -> Option<usize> {
        if self.native_writer < self.writers.len() {
            Some(self.native_writer)
        } else {
            None
        }
    }

    pub fn writer_is_native(&self, index: usize) -> bool {
        self.writers.get(index).map(|w| w.is_native()).unwrap_or(false)
    }

    /// Picks a reader by file extension, ignoring case.
    pub fn reader_for_path(&self, path: &Path) -> Option<&dyn SceneReader> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.readers.iter()
            .find(|r| r.extension().eq_ignore_ascii_case(&ext))
            .map(|r| r.as_ref())
    }

    /// Turns a selector into a writer index. Out-of-range indices fall back
    /// like `Native`. Without embedded media an ascii native writer wins over
    /// the default native one.
    pub fn resolve_writer(&self, selector: FormatSelector, embed_media: bool) -> Option<usize> {
        if let FormatSelector::Index(index) = selector {
            if index < self.writers.len() {
                return Some(index);
            }
        }

        let native = self.native_writer_format()?;
        if embed_media {
            return Some(native);
        }

        let ascii = (0..self.writers.len()).find(|&i| {
            self.writer_is_native(i) &&
                self.writers[i].description().to_ascii_lowercase().contains("ascii")
        });
        Some(ascii.unwrap_or(native))
    }

    pub fn reader_filters(&self) -> Vec<FileFilter> {
        self.readers.iter().map(|r| FileFilter {
            description: r.description().to_string(),
            extension: r.extension().to_string(),
        }).collect()
    }

    pub fn writer_filters(&self) -> Vec<FileFilter> {
        self.writers.iter().map(|w| FileFilter {
            description: w.description().to_string(),
            extension: w.extension().to_string(),
        }).collect()
    }

    /// File extension of a writer with its leading dot.
    pub fn writer_extension(&self, index: usize) -> Option<String> {
        self.writers.get(index).map(|w| format!(".{}", w.extension()))
    }
}
