// Copyright @yucwang 2026

use std::fs;
use std::path::Path;

use super::scene::{ Scene, FORMAT_VERSION };
use crate::io::format_registry::{
    ExportError, FileFilter, FormatRegistry, FormatSelector, ImportError, IoSettings,
};

/// Source of a password when a protected file is opened.
pub trait PasswordPrompt {
    fn ask(&mut self, path: &Path) -> Option<String>;
}

impl<F: FnMut(&Path) -> Option<String>> PasswordPrompt for F {
    fn ask(&mut self, path: &Path) -> Option<String> {
        self(path)
    }
}

/// Never answers.
pub struct NoPrompt;

impl PasswordPrompt for NoPrompt {
    fn ask(&mut self, _path: &Path) -> Option<String> {
        None
    }
}

pub struct Session {
    registry: FormatRegistry,
    settings: IoSettings,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self { registry: FormatRegistry::with_builtin_formats(), settings: IoSettings::default() }
    }

    pub fn with_registry(registry: FormatRegistry) -> Self {
        Self { registry, settings: IoSettings::default() }
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &IoSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut IoSettings {
        &mut self.settings
    }

    pub fn load_scene<P: AsRef<Path>>(&mut self, path: P,
                                      prompt: &mut dyn PasswordPrompt) -> Result<Scene, ImportError> {
        let path = path.as_ref();
        let reader = self.registry.reader_for_path(path)
            .ok_or_else(|| ImportError::UnsupportedFormat(path.to_path_buf()))?;

        let mut result = reader.read(path, &self.settings);
        if let Err(ImportError::Password) = result {
            log::warn!("{} is password protected.", path.display());
            if let Some(password) = prompt.ask(path) {
                self.settings.password = Some(password);
                result = reader.read(path, &self.settings);
                if let Err(ImportError::Password) = result {
                    log::error!("Incorrect password: file not imported.");
                }
            }
        }

        match &result {
            Ok(scene) => {
                log::info!("Session format version is {}.", FORMAT_VERSION);
                log::info!("File format version for file '{}' is {}.", path.display(), scene.version);
            }
            Err(ImportError::InvalidVersion { file, supported }) => {
                log::error!("Session format version is {}.", supported);
                log::error!("File format version for file '{}' is {}.", path.display(), file);
            }
            Err(err) => log::error!("Failed to import {}: {}", path.display(), err),
        }
        result
    }

    /// Renders `scene` with the selected writer and writes it to `path`.
    pub fn save_scene<P: AsRef<Path>>(&self, scene: &Scene, path: P,
                                      selector: FormatSelector, embed_media: bool) -> Result<(), ExportError> {
        let path = path.as_ref();
        let index = self.registry.resolve_writer(selector, embed_media)
            .ok_or(ExportError::UnsupportedFormat)?;
        let writer = self.registry.writer(index).ok_or(ExportError::UnsupportedFormat)?;
        log::info!("Exporting {} as {}.", path.display(), writer.description());

        let bytes = writer.write(scene)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn reader_filters(&self) -> Vec<FileFilter> {
        self.registry.reader_filters()
    }

    pub fn writer_filters(&self) -> Vec<FileFilter> {
        self.registry.writer_filters()
    }

    pub fn writer_extension(&self, index: usize) -> Option<String> {
        self.registry.writer_extension(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const LOCKED: &str = r#"<scene version="1.0.0" password="open sesame"><node name="RootNode"/></scene>"#;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).expect("write failed");
        path
    }

    #[test]
    fn test_password_retry_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "locked.xml", LOCKED);
        let mut session = Session::new();
        session.settings_mut().password = Some(String::from("wrong"));

        let mut asked = 0;
        let mut prompt = |_: &Path| {
            asked += 1;
            Some(String::from("open sesame"))
        };
        let scene = session.load_scene(&path, &mut prompt).expect("import failed");
        assert_eq!(asked, 1);
        assert_eq!(scene.password.as_deref(), Some("open sesame"));
    }

    #[test]
    fn test_second_password_failure_is_final() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "locked.xml", LOCKED);
        let mut session = Session::new();

        let mut asked = 0;
        let mut prompt = |_: &Path| {
            asked += 1;
            Some(String::from("still wrong"))
        };
        assert!(matches!(session.load_scene(&path, &mut prompt), Err(ImportError::Password)));
        assert_eq!(asked, 1);
        assert!(matches!(session.load_scene(&path, &mut NoPrompt), Err(ImportError::Password)));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "scene.fbx", "");
        let mut session = Session::new();
        assert!(matches!(session.load_scene(&path, &mut NoPrompt), Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_save_picks_ascii_native_writer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.xml");
        let session = Session::new();
        session.save_scene(&Scene::new(), &path, FormatSelector::Native, false).expect("export failed");
        let text = fs::read_to_string(&path).expect("read failed");
        assert!(text.lines().count() > 1);

        session.save_scene(&Scene::new(), &path, FormatSelector::Native, true).expect("export failed");
        let text = fs::read_to_string(&path).expect("read failed");
        assert_eq!(text.trim_end().lines().count(), 1);
    }

    #[test]
    fn test_custom_registry_native_writer() {
        use crate::io::obj_utils::ObjSceneWriter;
        use crate::io::scene_xml::XmlSceneReader;
        use crate::io::scene_xml_writer::XmlSceneWriter;

        let mut registry = FormatRegistry::empty();
        registry.register_reader(Box::new(XmlSceneReader));
        registry.register_writer(Box::new(ObjSceneWriter));
        let compact = registry.register_writer(Box::new(XmlSceneWriter::compact()));
        registry.set_native_writer(compact);
        let mut session = Session::with_registry(registry);
        assert_eq!(session.reader_filters().len(), 1);

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.xml");
        session.save_scene(&Scene::new(), &path, FormatSelector::Native, false).expect("export failed");
        let text = fs::read_to_string(&path).expect("read failed");
        assert!(text.starts_with("<?xml"));
        assert_eq!(text.trim_end().lines().count(), 1);
        assert_eq!(session.load_scene(&path, &mut NoPrompt).expect("import failed"), Scene::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.xml");
        let mut session = Session::new();
        let mut scene = Scene::new();
        scene.add_child(crate::core::node::Node::new("child"));
        session.save_scene(&scene, &path, FormatSelector::Index(0), false).expect("export failed");
        let loaded = session.load_scene(&path, &mut NoPrompt).expect("import failed");
        assert_eq!(loaded, scene);
        assert_eq!(session.writer_extension(0), Some(String::from(".xml")));
        assert_eq!(session.reader_filters().len(), 2);
    }
}
