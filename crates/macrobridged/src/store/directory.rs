use std::fs::{self, OpenOptions};
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use macrobridge_syntax::MacroName;
use tracing::debug;

use super::{MacroStore, StoreError, TemplateKind};

const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

/// File extension used for stored macros.
pub const MACRO_EXTENSION: &str = "FCMacro";

/// Stores each macro as `<root>/<name>.FCMacro`.
///
/// The root directory is created on first write.
#[derive(Debug, Clone)]
pub struct DirectoryMacroStore {
    root: Utf8PathBuf,
}

impl DirectoryMacroStore {
    /// Creates a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The macro directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn ensure_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })
    }

    fn canonical_root(&self) -> Result<Utf8PathBuf, StoreError> {
        self.ensure_root()?;
        canonicalize(&self.root)
    }
}

fn canonicalize(path: &Utf8Path) -> Result<Utf8PathBuf, StoreError> {
    let canonical = fs::canonicalize(path).map_err(|source| StoreError::io(path, source))?;
    Utf8PathBuf::from_path_buf(canonical).map_err(|raw| StoreError::NonUtf8Path {
        path: raw.display().to_string(),
    })
}

fn with_unix_newlines(code: &str) -> String {
    code.replace("\r\n", "\n")
}

impl MacroStore for DirectoryMacroStore {
    fn path_for(&self, name: &MacroName) -> Utf8PathBuf {
        self.root.join(format!("{name}.{MACRO_EXTENSION}"))
    }

    fn create(&self, name: &MacroName, template: TemplateKind) -> Result<Utf8PathBuf, StoreError> {
        self.ensure_root()?;
        let path = self.path_for(name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| {
                if source.kind() == io::ErrorKind::AlreadyExists {
                    StoreError::AlreadyExists { path: path.clone() }
                } else {
                    StoreError::io(path.clone(), source)
                }
            })?;
        file.write_all(template.contents().as_bytes())
            .map_err(|source| StoreError::io(path.clone(), source))?;
        debug!(target: STORE_TARGET, path = %path, %template, "macro created");
        Ok(path)
    }

    fn update(&self, name: &MacroName, code: &str) -> Result<Utf8PathBuf, StoreError> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(StoreError::NotFound { path });
        }
        fs::write(&path, with_unix_newlines(code))
            .map_err(|source| StoreError::io(path.clone(), source))?;
        debug!(target: STORE_TARGET, path = %path, bytes = code.len(), "macro updated");
        Ok(path)
    }

    fn read(&self, name: &MacroName) -> Result<String, StoreError> {
        let path = self.path_for(name);
        fs::read_to_string(&path).map_err(|source| StoreError::io(path, source))
    }

    fn read_path(&self, path: &Utf8Path) -> Result<String, StoreError> {
        let resolved = self.resolve(path)?;
        fs::read_to_string(&resolved).map_err(|source| StoreError::io(resolved, source))
    }

    fn resolve(&self, path: &Utf8Path) -> Result<Utf8PathBuf, StoreError> {
        let root = self.canonical_root()?;
        let candidate = if path.is_relative() {
            self.root.join(path)
        } else {
            path.to_owned()
        };
        let resolved = canonicalize(&candidate)?;
        if !resolved.starts_with(&root) {
            return Err(StoreError::OutsideMacroDir {
                path: resolved,
                root,
            });
        }
        if !resolved.is_file() {
            return Err(StoreError::NotFound { path: resolved });
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct StoreFixture {
        _dir: TempDir,
        store: DirectoryMacroStore,
    }

    #[fixture]
    fn fixture() -> StoreFixture {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().join("Macro")).expect("utf8 path");
        StoreFixture {
            _dir: dir,
            store: DirectoryMacroStore::new(root),
        }
    }

    fn name(raw: &str) -> MacroName {
        MacroName::parse(raw).expect("valid name")
    }

    #[rstest]
    fn create_writes_template_and_creates_directory(fixture: StoreFixture) {
        let path = fixture
            .store
            .create(&name("flange"), TemplateKind::Part)
            .expect("create");
        assert!(path.as_str().ends_with("flange.FCMacro"));
        let code = fixture.store.read(&name("flange")).expect("read");
        assert!(code.contains("import Part"));
    }

    #[rstest]
    fn create_refuses_existing_macro(fixture: StoreFixture) {
        fixture
            .store
            .create(&name("dup"), TemplateKind::Default)
            .expect("first create");
        let error = fixture
            .store
            .create(&name("dup"), TemplateKind::Default)
            .expect_err("second create must fail");
        assert!(matches!(error, StoreError::AlreadyExists { .. }));
    }

    #[rstest]
    fn update_requires_existing_macro(fixture: StoreFixture) {
        let error = fixture
            .store
            .update(&name("ghost"), "x = 1\n")
            .expect_err("update must fail");
        assert!(matches!(error, StoreError::NotFound { .. }));
    }

    #[rstest]
    fn update_normalises_line_endings(fixture: StoreFixture) {
        fixture
            .store
            .create(&name("crlf"), TemplateKind::Default)
            .expect("create");
        fixture
            .store
            .update(&name("crlf"), "a = 1\r\nb = 2\r\n")
            .expect("update");
        assert_eq!(
            fixture.store.read(&name("crlf")).expect("read"),
            "a = 1\nb = 2\n"
        );
    }

    #[rstest]
    fn resolve_accepts_relative_and_absolute_paths(fixture: StoreFixture) {
        let created = fixture
            .store
            .create(&name("inside"), TemplateKind::Basic)
            .expect("create");
        let relative = fixture
            .store
            .resolve(Utf8Path::new("inside.FCMacro"))
            .expect("resolve relative");
        let absolute = fixture.store.resolve(&created).expect("resolve absolute");
        assert_eq!(relative, absolute);
    }

    #[rstest]
    fn resolve_rejects_escape_from_macro_dir(fixture: StoreFixture) {
        fixture
            .store
            .create(&name("anchor"), TemplateKind::Default)
            .expect("create");
        let outside = fixture.store.root().join("../outside.FCMacro");
        fs::write(&outside, "x = 1\n").expect("write outside file");

        let error = fixture
            .store
            .resolve(Utf8Path::new("../outside.FCMacro"))
            .expect_err("escape must fail");
        assert!(matches!(error, StoreError::OutsideMacroDir { .. }));
    }

    #[rstest]
    fn resolve_reports_missing_file(fixture: StoreFixture) {
        let error = fixture
            .store
            .resolve(Utf8Path::new("absent.FCMacro"))
            .expect_err("missing file");
        assert!(matches!(error, StoreError::NotFound { .. }));
    }
}
