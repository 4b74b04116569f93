//! INI file storage provider.
//!
//! # How an update works (for beginners)
//!
//! Rewriting a whole configuration file would throw away comments, blank
//! lines and sections the application does not know about.  An update
//! instead re-reads the file top to bottom and copies every line through to
//! a fresh temp file, replacing only value lines that belong to a configured
//! key:
//!
//! ```text
//! [Server]          <- known key: remembered as "seen"
//! Port=8080         <- rewritten as Port=<current value>
//! # note            <- copied verbatim
//! [Legacy]          <- unknown key: header and body copied verbatim
//! mode=old
//! ```
//!
//! Positional lines (no `name=`) under a known key are rewritten with the
//! entries of the key's default value, first line first.  Lines beyond the
//! number of stored entries are copied as they are.
//!
//! The temp file then replaces the original in one rename, so a crash leaves
//! either the old file or the new one, never a half-written mix.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use confstore_core::{ConfigError, ConfigKey, Configuration};
use tracing::{debug, info};

use super::atomic::StagedFile;
use super::line::{classify, indentation, split_terminator, Line, ValueLine};
use super::writer::{write_configuration, write_key};
use crate::error::StorageError;
use crate::format::IniFormat;
use crate::provider::StorageProvider;

/// Stores a [`Configuration`] in a line-oriented INI file.
///
/// The file is opened lazily on first use and released by
/// [`dispose`](StorageProvider::dispose) or on drop.
#[derive(Debug)]
pub struct IniStorageProvider {
    path: PathBuf,
    read_only: bool,
    format: IniFormat,
    file: Option<File>,
    disposed: bool,
}

impl IniStorageProvider {
    /// Creates a provider for `path` using the classic INI format.
    ///
    /// # Errors
    ///
    /// Same as [`with_format`](Self::with_format).
    pub fn open(path: impl AsRef<Path>, read_only: bool) -> Result<Self, StorageError> {
        Self::with_format(path, read_only, IniFormat::default())
    }

    /// Creates a provider for `path` using `format`.
    ///
    /// Nothing is opened yet; a writable provider creates the file on first
    /// use if it does not exist.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidPath`] if the path is empty, does not name a
    ///   file, or contains characters the platform rejects.
    /// - [`StorageError::InvalidOperation`] if `format` is invalid, or if
    ///   `read_only` is set and the file does not exist.
    pub fn with_format(
        path: impl AsRef<Path>,
        read_only: bool,
        format: IniFormat,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        validate_path(&path)?;
        format.validate()?;
        if read_only && !path.is_file() {
            return Err(StorageError::InvalidOperation(format!(
                "cannot open missing file {} read-only",
                path.display()
            )));
        }

        debug!("INI provider created for {} (read_only={read_only})", path.display());
        Ok(Self {
            path,
            read_only,
            format,
            file: None,
            disposed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &IniFormat {
        &self.format
    }

    fn ensure_live(&self) -> Result<(), StorageError> {
        if self.disposed {
            return Err(StorageError::Disposed);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), StorageError> {
        self.ensure_live()?;
        if self.read_only {
            return Err(StorageError::ReadOnly(self.path.clone()));
        }
        Ok(())
    }

    /// The backing file, opened on first use.
    fn stream(&mut self) -> Result<&mut File, StorageError> {
        self.ensure_live()?;
        if self.file.is_none() {
            let opened = if self.read_only {
                File::open(&self.path)
            } else {
                OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(&self.path)
            };
            let file = opened.map_err(|e| StorageError::io(&self.path, e))?;
            debug!("opened {}", self.path.display());
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| StorageError::InvalidOperation("backing file not open".to_string()))
    }

    /// Reads every line from the start of the file, terminators included.
    fn read_lines(&mut self) -> Result<Vec<String>, StorageError> {
        let path = self.path.clone();
        let file = self.stream()?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| StorageError::io(&path, e))?;

        let mut reader = BufReader::new(file);
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let read = reader
                .read_line(&mut line)
                .map_err(|e| StorageError::io(&path, e))?;
            if read == 0 {
                break;
            }
            lines.push(line);
        }
        Ok(lines)
    }

    /// Swaps a fully written stage over the backing file.
    fn commit(&mut self, staged: StagedFile) -> Result<(), StorageError> {
        // The stream must be released before its file is replaced; the next
        // read reopens the new file.
        self.file = None;
        staged.commit(&self.path)
    }
}

impl StorageProvider for IniStorageProvider {
    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn load(&mut self) -> Result<Configuration, StorageError> {
        let lines = self.read_lines()?;
        let mut configuration = Configuration::new();
        let mut current: Option<usize> = None;
        let mut unnamed = 0usize;

        for (number, line) in numbered(&lines) {
            match classify(split_terminator(line).0, &self.format) {
                Line::Ignored => {}
                Line::Section(name) => {
                    let key = ConfigKey::new(name).map_err(at_line(number))?;
                    configuration.push(key).map_err(at_line(number))?;
                    current = Some(configuration.len() - 1);
                }
                Line::Value(value) => {
                    let Some(key) = current.and_then(|i| configuration.get_mut(i)) else {
                        debug!("line {number}: value outside any section ignored");
                        continue;
                    };
                    let added = match value.name {
                        Some(name) => key.add(name, value.literal.to_string(), true),
                        None => {
                            let name = self.format.unnamed(unnamed);
                            unnamed += 1;
                            key.add(name, value.literal.to_string(), false)
                        }
                    };
                    added.map_err(at_line(number))?;
                }
            }
        }

        info!(
            "loaded {} keys from {}",
            configuration.len(),
            self.path.display()
        );
        Ok(configuration)
    }

    fn load_into(&mut self, configuration: &mut Configuration) -> Result<(), StorageError> {
        let lines = self.read_lines()?;
        let mut current: Option<usize> = None;
        let mut reset: HashSet<usize> = HashSet::new();

        for (number, line) in numbered(&lines) {
            match classify(split_terminator(line).0, &self.format) {
                Line::Ignored => {}
                Line::Section(name) => {
                    current = configuration.index_of(name);
                    match current {
                        // Start the positional sequence afresh, once per load.
                        Some(index) if reset.insert(index) => {
                            if let Some(default) =
                                configuration.get_mut(index).and_then(ConfigKey::default_value_mut)
                            {
                                default.reset_value();
                            }
                        }
                        Some(_) => {}
                        None => debug!("line {number}: section [{name}] not in schema, skipped"),
                    }
                }
                Line::Value(value) => {
                    let Some(key) = current.and_then(|i| configuration.get_mut(i)) else {
                        continue;
                    };
                    load_value(key, value).map_err(at_line(number))?;
                }
            }
        }

        info!(
            "loaded {} of {} schema keys from {}",
            reset.len(),
            configuration.len(),
            self.path.display()
        );
        Ok(())
    }

    fn update_with(
        &mut self,
        configuration: &Configuration,
        add_missing_keys: bool,
    ) -> Result<(), StorageError> {
        self.ensure_writable()?;
        let lines = self.read_lines()?;
        let separator = self.format.separator;
        let mut staged = StagedFile::create(&self.path, self.format.temp_dir.as_deref())?;

        let mut seen = vec![false; configuration.len()];
        // Positional lines are counted per key across repeated headers, as on load.
        let mut cursors = vec![0usize; configuration.len()];
        let mut section: Option<(usize, Section<'_>)> = None;
        let mut rewritten = 0usize;

        for line in &lines {
            let (content, terminator) = split_terminator(line);
            let replacement = match classify(content, &self.format) {
                Line::Ignored => None,
                Line::Section(name) => {
                    section = configuration.index_of(name).map(|index| {
                        seen[index] = true;
                        (index, Section::enter(&configuration[index]))
                    });
                    None
                }
                Line::Value(value) => section
                    .as_ref()
                    .and_then(|(index, s)| s.replacement(value, separator, &mut cursors[*index])),
            };

            let written = match replacement {
                Some(text) => {
                    rewritten += 1;
                    write!(staged, "{}{text}{terminator}", indentation(content))
                }
                None => staged.write_all(line.as_bytes()),
            };
            written.map_err(|e| StorageError::io(staged.path(), e))?;
        }

        let mut appended = 0usize;
        if add_missing_keys {
            for (key, _) in configuration.iter().zip(&seen).filter(|(_, seen)| !**seen) {
                write_key(&mut staged, key, separator)
                    .map_err(|e| StorageError::io(staged.path(), e))?;
                appended += 1;
            }
        }

        self.commit(staged)?;
        info!(
            "updated {}: {rewritten} lines rewritten, {appended} keys appended",
            self.path.display()
        );
        Ok(())
    }

    fn save(&mut self, configuration: &Configuration) -> Result<(), StorageError> {
        self.ensure_writable()?;
        let mut staged = StagedFile::create(&self.path, self.format.temp_dir.as_deref())?;
        write_configuration(&mut staged, configuration, self.format.separator)
            .map_err(|e| StorageError::io(staged.path(), e))?;

        self.commit(staged)?;
        info!(
            "saved {} keys to {}",
            configuration.len(),
            self.path.display()
        );
        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.file = None;
        self.disposed = true;
        debug!("INI provider for {} disposed", self.path.display());
    }
}

impl Drop for IniStorageProvider {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ── Update helpers ────────────────────────────────────────────────────────────

/// A configured key whose section is being rewritten.
struct Section<'a> {
    key: &'a ConfigKey,
    entries: Vec<Option<String>>,
}

impl<'a> Section<'a> {
    fn enter(key: &'a ConfigKey) -> Self {
        let entries = key
            .default_value()
            .map(|value| value.stored_strings())
            .unwrap_or_default();
        Self { key, entries }
    }

    /// Text replacing a value line, without indentation or terminator.
    /// `None` keeps the line as it is.  `cursor` is the key's positional
    /// line count so far and advances on every positional line.
    fn replacement(&self, value: ValueLine<'_>, separator: char, cursor: &mut usize) -> Option<String> {
        match value.name {
            Some(name) => {
                let stored = self.key.value(name)?;
                let literal = stored.primary_string().unwrap_or_default();
                Some(format!("{name}{separator}{literal}"))
            }
            None => {
                let index = *cursor;
                *cursor += 1;
                self.entries
                    .get(index)
                    .map(|entry| entry.clone().unwrap_or_default())
            }
        }
    }
}

// ── Load helpers ──────────────────────────────────────────────────────────────

/// Routes one value line into a schema key.
fn load_value(key: &mut ConfigKey, value: ValueLine<'_>) -> Result<(), ConfigError> {
    match value.name {
        None => match key.default_value_mut() {
            Some(default) => default.add_parsed_string(value.literal),
            None => {
                debug!("positional line in [{}] has no default value, ignored", key.name());
                Ok(())
            }
        },
        Some(name) => match key.value_mut(name) {
            Some(target) => target.parse_string(value.literal),
            None => {
                debug!("value '{name}' not in schema key [{}], ignored", key.name());
                Ok(())
            }
        },
    }
}

fn numbered(lines: &[String]) -> impl Iterator<Item = (usize, &str)> {
    lines.iter().enumerate().map(|(i, line)| (i + 1, line.as_str()))
}

fn at_line(line: usize) -> impl FnOnce(ConfigError) -> StorageError {
    move |source| StorageError::Line { line, source }
}

// ── Path validation ───────────────────────────────────────────────────────────

#[cfg(windows)]
const INVALID_PATH_CHARS: &[char] = &['<', '>', '"', '|'];
#[cfg(windows)]
const INVALID_FILE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
#[cfg(not(windows))]
const INVALID_PATH_CHARS: &[char] = &[];
#[cfg(not(windows))]
const INVALID_FILE_NAME_CHARS: &[char] = &['/'];

fn validate_path(path: &Path) -> Result<(), StorageError> {
    let invalid = |reason: &str| StorageError::InvalidPath {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(invalid("path is empty"));
    }
    if text.chars().any(|c| c == '\0' || INVALID_PATH_CHARS.contains(&c)) {
        return Err(invalid("path contains an invalid character"));
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| invalid("path does not name a file"))?
        .to_string_lossy();
    if file_name
        .chars()
        .any(|c| c.is_control() || INVALID_FILE_NAME_CHARS.contains(&c))
    {
        return Err(invalid("file name contains an invalid character"));
    }
    Ok(())
}
