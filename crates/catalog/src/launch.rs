//! External program invocations for catalog selections.
//!
//! The bridge only builds argument lists. [`Invocation::spawn`] starts the
//! process; whoever calls it owns the outcome.

use crate::error::{ErrorKind, Result};
use crate::sources::Profile;
use exn::ResultExt;
use folio_config::Settings;
use folio_store::Library;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::{Child, Command};
use tracing::{debug, instrument};

/// File extensions Calibre accepts through "add to library". Case-sensitive.
pub const EBOOK_EXTENSIONS: [&str; 9] = ["epub", "pdf", "mobi", "prc", "txt", "doc", "rtf", "html", "chm"];

/// A program and its arguments, ready to be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
}
impl Invocation {
    /// Start the program without waiting for it. The program is looked up
    /// on `PATH` first.
    #[instrument(skip(self), fields(program = %self.program))]
    pub fn spawn(&self) -> Result<Child> {
        let launch = || ErrorKind::Launch(self.program.clone());
        let executable = which::which(&self.program).or_raise(launch)?;
        debug!(executable = %executable.display(), args = ?self.args, "spawning");
        Command::new(executable).args(&self.args).spawn().or_raise(launch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchBridge {
    calibre: String,
    unison: String,
}
impl Default for LaunchBridge {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
impl LaunchBridge {
    pub fn new(calibre: impl Into<String>, unison: impl Into<String>) -> Self {
        Self { calibre: calibre.into(), unison: unison.into() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.calibre.program, &settings.unison.program)
    }

    /// Whether `file` can be added to a library.
    pub fn is_ebook(file: &Path) -> bool {
        file.extension().and_then(OsStr::to_str).is_some_and(|ext| EBOOK_EXTENSIONS.contains(&ext))
    }

    /// `calibre --with-library=<library>`
    pub fn open_library(&self, library: &Library) -> Invocation {
        Invocation { program: self.calibre.clone(), args: vec![with_library(library)] }
    }

    /// `calibre --with-library=<library> <file>`
    ///
    /// Returns [`ErrorKind::UnsupportedFormat`] unless the file has one of
    /// the [`EBOOK_EXTENSIONS`].
    pub fn add_to_library(&self, library: &Library, file: &Path) -> Result<Invocation> {
        if !Self::is_ebook(file) {
            exn::bail!(ErrorKind::UnsupportedFormat(file.to_path_buf()));
        }
        Ok(Invocation { program: self.calibre.clone(), args: vec![with_library(library), file.as_os_str().to_owned()] })
    }

    /// `unison <profile>`
    pub fn open_profile(&self, profile: &Profile) -> Invocation {
        Invocation { program: self.unison.clone(), args: vec![OsString::from(&profile.name)] }
    }
}

fn with_library(library: &Library) -> OsString {
    let mut arg = OsString::from("--with-library=");
    arg.push(library.path());
    arg
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    fn library() -> Library {
        Library::new("/home/reader/Calibre Library").unwrap()
    }

    #[test]
    fn open_library_passes_one_argument() {
        let invocation = LaunchBridge::default().open_library(&library());
        assert_eq!(invocation.program, "calibre");
        assert_eq!(invocation.args, vec![OsString::from("--with-library=/home/reader/Calibre Library")]);
    }

    #[test]
    fn add_to_library_appends_the_file() {
        let invocation = LaunchBridge::new("/opt/calibre/calibre", "unison")
            .add_to_library(&library(), Path::new("/tmp/Dune.epub"))
            .unwrap();
        assert_eq!(invocation.program, "/opt/calibre/calibre");
        assert_eq!(
            invocation.args,
            vec![OsString::from("--with-library=/home/reader/Calibre Library"), OsString::from("/tmp/Dune.epub")]
        );
    }

    #[rstest]
    #[case("book.epub", true)]
    #[case("book.chm", true)]
    #[case("archive.tar.html", true)]
    #[case("book.EPUB", false)]
    #[case("book.azw3", false)]
    #[case("epub", false)]
    #[case("book.", false)]
    fn ebook_whitelist_is_case_sensitive(#[case] file: &str, #[case] expected: bool) {
        assert_eq!(LaunchBridge::is_ebook(Path::new(file)), expected);
    }

    #[test]
    fn unsupported_files_are_rejected() {
        let err = LaunchBridge::default().add_to_library(&library(), Path::new("/tmp/cover.jpg")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(path) if path == &PathBuf::from("/tmp/cover.jpg")));
    }

    #[test]
    fn open_profile_uses_the_profile_name() {
        let profile = Profile { name: "work".to_string(), path: PathBuf::from("/home/reader/.unison/work.prf") };
        let invocation = LaunchBridge::default().open_profile(&profile);
        assert_eq!(invocation.program, "unison");
        assert_eq!(invocation.args, vec![OsString::from("work")]);
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let invocation = Invocation { program: "folio-test-no-such-program".to_string(), args: Vec::new() };
        let err = invocation.spawn().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Launch(program) if program == "folio-test-no-such-program"));
    }
}
