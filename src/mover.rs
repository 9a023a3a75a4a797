// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Moving images into label folders, and moving them back
//!
//! Every move is a single `rename`. Destination names are claimed with a
//! create-new placeholder before the rename lands on top of it, so two
//! movers racing for `photo_1.jpg` cannot both get it, and a restore never
//! replaces a file that reappeared at the original location.

use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use crate::lister::is_supported_image;
use crate::paths::{display_path, PathResolver};
use crate::{Result, SorterError};

/// A completed move; feed it back to [`MoveEngine::restore`] to undo it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub source: String,
    pub destination: String,
}

/// A completed restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreRecord {
    pub from: String,
    pub to: String,
}

/// Why an item was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The image does not exist or is not a regular file
    SourceMissing,
    /// The image's extension is not one we sort
    UnsupportedExtension,
    /// Nothing at the moved-to location (already restored, or never moved)
    NothingToRestore,
    /// The folder to restore into is gone
    RestoreParentMissing,
}

/// Per-item result: done, or deliberately skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    Skipped(SkipReason),
}

/// Labels must name exactly one directory below the target
pub fn validate_label(label: &str) -> Result<()> {
    let mut components = Path::new(label).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !label.contains(['/', '\\']) => Ok(()),
        _ => Err(SorterError::InvalidLabel(label.to_string())),
    }
}

/// Moves images into `<target>/<label>/` and back
#[derive(Debug, Clone)]
pub struct MoveEngine {
    resolver: PathResolver,
}

impl MoveEngine {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Move one image into the `label` folder under `target_raw`
    pub fn classify(
        &self,
        image_raw: &str,
        label: &str,
        target_raw: &str,
    ) -> Result<Outcome<MoveRecord>> {
        let source = self.resolver.resolve(image_raw);

        if !source.is_file() {
            debug!("Skipping missing image: {:?}", source);
            return Ok(Outcome::Skipped(SkipReason::SourceMissing));
        }
        let Some(file_name) = source.file_name().filter(|_| is_supported_image(&source)) else {
            debug!("Skipping unsupported file: {:?}", source);
            return Ok(Outcome::Skipped(SkipReason::UnsupportedExtension));
        };

        let target = self.resolver.resolve(target_raw);
        if !target.exists() {
            return Err(SorterError::NotFound(target));
        }
        if !target.is_dir() {
            return Err(SorterError::NotADirectory(target));
        }

        validate_label(label)?;
        let label_dir = target.join(label);
        ensure_dir(&label_dir)?;

        let destination = claim_free_name(&label_dir, file_name)?;

        if let Err(e) = move_onto_claim(&source, &destination) {
            release_claim(&destination);
            if e.kind() == io::ErrorKind::NotFound && !source.exists() {
                debug!("Image vanished before it could be moved: {:?}", source);
                return Ok(Outcome::Skipped(SkipReason::SourceMissing));
            }
            return Err(SorterError::from_io(e, &source));
        }

        info!("Moved {:?} -> {:?}", source, destination);
        Ok(Outcome::Completed(MoveRecord {
            source: display_path(&source),
            destination: display_path(&destination),
        }))
    }

    /// Move a file from `current_raw` back to `original_raw`.
    ///
    /// Never overwrites: an occupied original location fails with
    /// [`SorterError::RestoreConflict`] and both files stay where they are.
    pub fn restore(&self, current_raw: &str, original_raw: &str) -> Result<Outcome<RestoreRecord>> {
        let (current, original) = match self.restore_paths(current_raw, original_raw) {
            Ok(paths) => paths,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        match claim(&original) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(SorterError::RestoreConflict(original));
            }
            Err(e) => return Err(SorterError::from_io(e, &original)),
        }

        if let Err(e) = move_onto_claim(&current, &original) {
            release_claim(&original);
            if e.kind() == io::ErrorKind::NotFound && !current.exists() {
                return Ok(Outcome::Skipped(SkipReason::NothingToRestore));
            }
            return Err(SorterError::from_io(e, &current));
        }

        info!("Restored {:?} -> {:?}", current, original);
        Ok(Outcome::Completed(RestoreRecord {
            from: display_path(&current),
            to: display_path(&original),
        }))
    }

    /// What [`restore`](Self::restore) would do right now, without touching
    /// the filesystem
    pub fn plan_restore(
        &self,
        current_raw: &str,
        original_raw: &str,
    ) -> Result<Outcome<RestoreRecord>> {
        let (current, original) = match self.restore_paths(current_raw, original_raw) {
            Ok(paths) => paths,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        if fs::symlink_metadata(&original).is_ok() {
            return Err(SorterError::RestoreConflict(original));
        }

        Ok(Outcome::Completed(RestoreRecord {
            from: display_path(&current),
            to: display_path(&original),
        }))
    }

    /// Resolve a restore pair, or say why there is nothing to do
    fn restore_paths(
        &self,
        current_raw: &str,
        original_raw: &str,
    ) -> std::result::Result<(PathBuf, PathBuf), SkipReason> {
        let current = self.resolver.resolve(current_raw);
        let original = self.resolver.resolve(original_raw);

        if !current.is_file() {
            debug!("Nothing to restore at {:?}", current);
            return Err(SkipReason::NothingToRestore);
        }

        let parent = match original.parent() {
            Some(p) if p.as_os_str().is_empty() => Path::new("."),
            Some(p) => p,
            None => return Err(SkipReason::RestoreParentMissing),
        };
        if !parent.is_dir() {
            debug!("Restore folder is gone: {:?}", parent);
            return Err(SkipReason::RestoreParentMissing);
        }

        Ok((current, original))
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::create_dir(dir) {
        Ok(()) => {
            info!("Created label folder: {:?}", dir);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(SorterError::from_io(e, dir)),
    }
}

/// Atomically create an empty placeholder at `path`
fn claim(path: &Path) -> io::Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(|_| ())
}

fn release_claim(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("Failed to remove placeholder {:?}: {}", path, e);
    }
}

/// Claim `name` in `dir`, or the first free `stem_<n>.ext` after it
fn claim_free_name(dir: &Path, name: &OsStr) -> Result<PathBuf> {
    let mut candidate = dir.join(name);
    let mut n: u64 = 1;

    loop {
        match claim(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                candidate = dir.join(suffixed_name(Path::new(name), n));
                n += 1;
            }
            Err(e) => return Err(SorterError::from_io(e, &candidate)),
        }
    }
}

fn suffixed_name(name: &Path, n: u64) -> OsString {
    let mut suffixed = name.file_stem().unwrap_or_default().to_os_string();
    suffixed.push(format!("_{}", n));
    if let Some(ext) = name.extension() {
        suffixed.push(".");
        suffixed.push(ext);
    }
    suffixed
}

/// Rename `source` over the placeholder at `destination`
fn move_onto_claim(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            warn!(
                "{:?} and {:?} are on different filesystems, copying instead of renaming",
                source, destination
            );
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    impl<T> Outcome<T> {
        fn completed(self) -> Option<T> {
            match self {
                Outcome::Completed(value) => Some(value),
                Outcome::Skipped(_) => None,
            }
        }
    }

    struct Fixture {
        _dir: TempDir,
        inbox: PathBuf,
        target: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let inbox = dir.path().join("inbox");
        let target = dir.path().join("sorted");
        fs::create_dir(&inbox).unwrap();
        fs::create_dir(&target).unwrap();
        Fixture { _dir: dir, inbox, target }
    }

    fn write(path: &Path, contents: &str) -> String {
        fs::write(path, contents).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn engine() -> MoveEngine {
        MoveEngine::new(PathResolver::default())
    }

    #[test]
    fn test_classify_moves_into_label_folder() {
        let fx = fixture();
        let source = write(&fx.inbox.join("cat.jpg"), "meow");

        let record = engine()
            .classify(&source, "cats", fx.target.to_str().unwrap())
            .unwrap()
            .completed()
            .unwrap();

        let expected = fx.target.join("cats").join("cat.jpg");
        assert_eq!(record.source, source);
        assert_eq!(record.destination, expected.to_str().unwrap());
        assert!(!Path::new(&source).exists());
        assert_eq!(fs::read_to_string(expected).unwrap(), "meow");
    }

    #[test]
    fn test_conflicting_names_get_numbered() {
        let fx = fixture();
        let target = fx.target.to_str().unwrap();
        let engine = engine();

        let mut destinations = Vec::new();
        for (i, sub) in ["a", "b", "c"].iter().enumerate() {
            let dir = fx.inbox.join(sub);
            fs::create_dir(&dir).unwrap();
            let source = write(&dir.join("photo.JPG"), &i.to_string());
            let record = engine.classify(&source, "dogs", target).unwrap().completed().unwrap();
            destinations.push(record.destination);
        }

        let label_dir = fx.target.join("dogs");
        assert_eq!(
            destinations,
            vec![
                label_dir.join("photo.JPG").to_str().unwrap().to_string(),
                label_dir.join("photo_1.JPG").to_str().unwrap().to_string(),
                label_dir.join("photo_2.JPG").to_str().unwrap().to_string(),
            ]
        );
        assert_eq!(fs::read_to_string(label_dir.join("photo_2.JPG")).unwrap(), "2");
    }

    #[test]
    fn test_taken_suffix_is_skipped() {
        let fx = fixture();
        let label_dir = fx.target.join("dogs");
        fs::create_dir(&label_dir).unwrap();
        write(&label_dir.join("photo.png"), "old");
        write(&label_dir.join("photo_1.png"), "old");

        let source = write(&fx.inbox.join("photo.png"), "new");
        let record = engine()
            .classify(&source, "dogs", fx.target.to_str().unwrap())
            .unwrap()
            .completed()
            .unwrap();

        assert!(record.destination.ends_with("photo_2.png"));
        assert_eq!(fs::read_to_string(label_dir.join("photo_1.png")).unwrap(), "old");
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let fx = fixture();
        let missing = fx.inbox.join("nope.jpg");
        let outcome = engine()
            .classify(missing.to_str().unwrap(), "x", fx.target.to_str().unwrap())
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::SourceMissing));
        assert!(!fx.target.join("x").exists());
    }

    #[test]
    fn test_unsupported_extension_is_skipped() {
        let fx = fixture();
        let source = write(&fx.inbox.join("notes.txt"), "text");
        let outcome = engine()
            .classify(&source, "x", fx.target.to_str().unwrap())
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::UnsupportedExtension));
        assert!(Path::new(&source).exists());
    }

    #[test]
    fn test_missing_target_is_not_found() {
        let fx = fixture();
        let source = write(&fx.inbox.join("cat.png"), "x");
        let missing = fx.target.join("nowhere");

        let err = engine()
            .classify(&source, "cats", missing.to_str().unwrap())
            .unwrap_err();
        assert!(matches!(err, SorterError::NotFound(_)));
        assert!(!missing.exists());
        assert!(Path::new(&source).exists());
    }

    #[test]
    fn test_existing_label_folder_is_reused() {
        let fx = fixture();
        fs::create_dir(fx.target.join("cats")).unwrap();
        let source = write(&fx.inbox.join("cat.jpeg"), "x");

        let outcome = engine()
            .classify(&source, "cats", fx.target.to_str().unwrap())
            .unwrap();
        assert!(matches!(outcome, Outcome::Completed(_)));
    }

    #[test]
    fn test_invalid_labels_rejected() {
        for label in ["", ".", "..", "a/b", "a\\b", "/abs"] {
            assert!(
                matches!(validate_label(label), Err(SorterError::InvalidLabel(_))),
                "label {:?} should be rejected",
                label
            );
        }
        validate_label("cats").unwrap();
        validate_label("猫 です").unwrap();
    }

    #[test]
    fn test_round_trip() {
        let fx = fixture();
        let source = write(&fx.inbox.join("bird.png"), "tweet");
        let engine = engine();

        let moved = engine
            .classify(&source, "birds", fx.target.to_str().unwrap())
            .unwrap()
            .completed()
            .unwrap();
        let restored = engine
            .restore(&moved.destination, &moved.source)
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(restored.from, moved.destination);
        assert_eq!(restored.to, source);
        assert_eq!(fs::read_to_string(&source).unwrap(), "tweet");
        assert!(!Path::new(&moved.destination).exists());
    }

    #[test]
    fn test_restore_twice_is_skipped() {
        let fx = fixture();
        let source = write(&fx.inbox.join("bird.png"), "tweet");
        let engine = engine();

        let moved = engine
            .classify(&source, "birds", fx.target.to_str().unwrap())
            .unwrap()
            .completed()
            .unwrap();
        engine.restore(&moved.destination, &moved.source).unwrap();

        let again = engine.restore(&moved.destination, &moved.source).unwrap();
        assert_eq!(again, Outcome::Skipped(SkipReason::NothingToRestore));
    }

    #[test]
    fn test_restore_into_vanished_folder_is_skipped() {
        let fx = fixture();
        let current = write(&fx.target.join("a.jpg"), "x");
        let original = fx.inbox.join("gone").join("a.jpg");

        let outcome = engine()
            .restore(&current, original.to_str().unwrap())
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::RestoreParentMissing));
        assert!(Path::new(&current).exists());
    }

    #[test]
    fn test_restore_never_overwrites() {
        let fx = fixture();
        let current = write(&fx.target.join("a.jpg"), "moved");
        let original = write(&fx.inbox.join("a.jpg"), "newcomer");

        let err = engine().restore(&current, &original).unwrap_err();
        assert!(matches!(err, SorterError::RestoreConflict(_)));
        assert_eq!(fs::read_to_string(&current).unwrap(), "moved");
        assert_eq!(fs::read_to_string(&original).unwrap(), "newcomer");
    }

    #[test]
    fn test_target_that_is_a_file_is_not_a_directory() {
        let fx = fixture();
        let source = write(&fx.inbox.join("cat.png"), "x");
        let not_dir = write(&fx.target.join("plain.txt"), "x");

        let err = engine().classify(&source, "cats", &not_dir).unwrap_err();
        assert!(matches!(err, SorterError::NotADirectory(_)));
        assert!(Path::new(&source).exists());
    }

    #[test]
    fn test_plan_restore_matches_restore() {
        let fx = fixture();
        let current = write(&fx.target.join("a.jpg"), "moved");
        let original = fx.inbox.join("a.jpg");
        let engine = engine();

        let planned = engine
            .plan_restore(&current, original.to_str().unwrap())
            .unwrap()
            .completed()
            .unwrap();
        assert!(Path::new(&current).exists());
        assert!(!original.exists());

        let restored = engine
            .restore(&current, original.to_str().unwrap())
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(planned, restored);
    }

    #[test]
    fn test_plan_restore_reports_occupied_original() {
        let fx = fixture();
        let current = write(&fx.target.join("a.jpg"), "moved");
        let original = write(&fx.inbox.join("a.jpg"), "newcomer");

        let err = engine().plan_restore(&current, &original).unwrap_err();
        assert!(matches!(err, SorterError::RestoreConflict(_)));
        assert_eq!(fs::read_to_string(&current).unwrap(), "moved");
        assert_eq!(fs::read_to_string(&original).unwrap(), "newcomer");
    }

    #[test]
    fn test_plan_restore_skips_like_restore() {
        let fx = fixture();
        let current = write(&fx.target.join("a.jpg"), "x");
        let vanished = fx.inbox.join("gone").join("a.jpg");
        let engine = engine();

        assert_eq!(
            engine.plan_restore(&current, vanished.to_str().unwrap()).unwrap(),
            Outcome::Skipped(SkipReason::RestoreParentMissing)
        );
        let missing = fx.target.join("nothing.jpg");
        assert_eq!(
            engine
                .plan_restore(missing.to_str().unwrap(), fx.inbox.join("b.jpg").to_str().unwrap())
                .unwrap(),
            Outcome::Skipped(SkipReason::NothingToRestore)
        );
    }

    #[test]
    fn test_suffixed_name_keeps_extension() {
        assert_eq!(suffixed_name(Path::new("a.b.jpg"), 3), OsString::from("a.b_3.jpg"));
        assert_eq!(suffixed_name(Path::new("noext"), 1), OsString::from("noext_1"));
    }
}
