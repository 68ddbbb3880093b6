//! Word lookup in a StarDict dictionary.
//!
//! A dictionary is a family of files sharing one stem:
//! - `.ifo`: `key=value` header lines (`idxoffsetbits`, `sametypesequence`);
//! - `.idx` or `.idx.gz`: entries of `word\0`, article offset, article size,
//!   integers big-endian;
//! - `.dict` or `.dict.dz`: the articles the entries point into.
//!
//! Articles are reduced to plain lines: `<br>` and NUL become line breaks,
//! markup is stripped, blank lines are dropped.

use crate::error::{ErrorKind, Result};
use crate::sources::Dictionary;
use exn::{OptionExt, ResultExt};
use flate2::read::GzDecoder;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, instrument};

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?.+?>").unwrap());

/// The `.ifo` keys that matter for reading articles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Header {
    /// `idxoffsetbits=64`; offsets are 32 bits otherwise.
    wide_offsets: bool,
    same_type_sequence: Option<String>,
}
impl Header {
    fn parse(text: &str) -> Self {
        let mut header = Self::default();
        for (key, value) in text.lines().filter_map(|line| line.split_once('=')) {
            match key.trim() {
                "idxoffsetbits" => header.wide_offsets = value.trim() == "64",
                "sametypesequence" if !value.trim().is_empty() => {
                    header.same_type_sequence = Some(value.trim().to_string());
                },
                _ => {},
            }
        }
        header
    }
}

/// Where one article lives in the `.dict` data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    offset: u64,
    size: u64,
}

impl Dictionary {
    /// The article for `word`, as plain lines.
    ///
    /// Matching is exact. An unknown or blank word has no lines. Returns
    /// [`ErrorKind::Dictionary`] when the index or article data cannot be
    /// read.
    #[instrument(level = "debug", skip(self), fields(dictionary = %self.name))]
    pub fn lookup(&self, word: &str) -> Result<Vec<String>> {
        let word = word.trim();
        if word.is_empty() {
            return Ok(Vec::new());
        }
        let info = std::fs::read_to_string(&self.path).or_raise(|| ErrorKind::Dictionary(self.path.clone()))?;
        let header = Header::parse(&info);
        let index = read_either(&self.path.with_extension("idx"), &self.path.with_extension("idx.gz"))?;
        let entries = find(&index, word.as_bytes(), header.wide_offsets);
        if entries.is_empty() {
            debug!(word, "not in dictionary");
            return Ok(Vec::new());
        }
        let data = read_either(&self.path.with_extension("dict"), &self.path.with_extension("dict.dz"))?;
        let mut lines = Vec::new();
        for entry in entries {
            let article = usize::try_from(entry.offset)
                .ok()
                .zip(usize::try_from(entry.size).ok())
                .and_then(|(offset, size)| data.get(offset..offset.checked_add(size)?))
                .ok_or_raise(|| ErrorKind::Dictionary(self.path.clone()))?;
            let text: Vec<String> = fields(article, header.same_type_sequence.as_deref())
                .into_iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect();
            lines.extend(clean(&text.join("\n")));
        }
        Ok(lines)
    }
}

/// Read `plain`, or failing that the gzip-compressed `compressed`.
fn read_either(plain: &Path, compressed: &Path) -> Result<Vec<u8>> {
    if plain.is_file() {
        return std::fs::read(plain).or_raise(|| ErrorKind::Dictionary(plain.to_path_buf()));
    }
    let unreadable = || ErrorKind::Dictionary(compressed.to_path_buf());
    let mut data = Vec::new();
    GzDecoder::new(File::open(compressed).or_raise(unreadable)?).read_to_end(&mut data).or_raise(unreadable)?;
    Ok(data)
}

/// Every index entry for `word`. A truncated index ends the search.
fn find(index: &[u8], word: &[u8], wide_offsets: bool) -> Vec<Entry> {
    let offset_len = if wide_offsets { 8 } else { 4 };
    let mut found = Vec::new();
    let mut rest = index;
    while let Some(nul) = memchr::memchr(0, rest) {
        let key = &rest[..nul];
        let Some((offset, tail)) = rest[nul + 1..].split_at_checked(offset_len) else {
            debug!("truncated dictionary index");
            break;
        };
        let Some((size, tail)) = tail.split_at_checked(4) else {
            debug!("truncated dictionary index");
            break;
        };
        if key == word {
            found.push(Entry { offset: big_endian(offset), size: big_endian(size) });
        }
        rest = tail;
    }
    found
}

fn big_endian(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// The textual fields of an article.
///
/// With a `sametypesequence` the type characters are left out of the data
/// and the last field runs to the end of the article. Without one, every
/// field starts with its type character. Lower-case types are text,
/// NUL-terminated; upper-case types are binary, prefixed with a 32-bit size,
/// and skipped.
fn fields<'a>(mut article: &'a [u8], same_type_sequence: Option<&str>) -> Vec<&'a [u8]> {
    let mut texts = Vec::new();
    match same_type_sequence {
        Some(sequence) => {
            let count = sequence.chars().count();
            for (i, kind) in sequence.chars().enumerate() {
                let Some((field, rest)) = take_field(article, kind, i + 1 == count) else {
                    break;
                };
                if kind.is_ascii_lowercase() {
                    texts.push(field);
                }
                article = rest;
            }
        },
        None => {
            while let Some((&kind, rest)) = article.split_first() {
                let kind = char::from(kind);
                let Some((field, rest)) = take_field(rest, kind, false) else {
                    break;
                };
                if kind.is_ascii_lowercase() {
                    texts.push(field);
                }
                article = rest;
            }
        },
    }
    texts
}

/// Split one field of type `kind` off the front of `data`.
fn take_field(data: &[u8], kind: char, last: bool) -> Option<(&[u8], &[u8])> {
    if last {
        return Some((data, &[]));
    }
    if kind.is_ascii_lowercase() {
        return Some(match memchr::memchr(0, data) {
            Some(nul) => (&data[..nul], &data[nul + 1..]),
            None => (data, &[]),
        });
    }
    let (size, rest) = data.split_at_checked(4)?;
    rest.split_at_checked(usize::try_from(big_endian(size)).ok()?)
}

fn clean(article: &str) -> Vec<String> {
    let article = article.replace("<br>", "\n").replace('\0', "\n");
    MARKUP
        .replace_all(&article, "")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use rstest::rstest;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Write a dictionary called `stem` holding `articles` in the given
    /// order, and return it.
    fn dictionary(dir: &Path, stem: &str, ifo_extra: &str, articles: &[(&str, &[u8])], gzip: bool) -> Dictionary {
        let mut index = Vec::new();
        let mut data = Vec::new();
        for (word, article) in articles {
            index.extend_from_slice(word.as_bytes());
            index.push(0);
            index.extend_from_slice(&u32::try_from(data.len()).unwrap().to_be_bytes());
            index.extend_from_slice(&u32::try_from(article.len()).unwrap().to_be_bytes());
            data.extend_from_slice(article);
        }
        let ifo = dir.join(format!("{stem}.ifo"));
        std::fs::write(&ifo, format!("StarDict's dict ifo file\nversion=2.4.2\nbookname={stem}\n{ifo_extra}")).unwrap();
        std::fs::write(dir.join(format!("{stem}.idx")), index).unwrap();
        if gzip {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data).unwrap();
            std::fs::write(dir.join(format!("{stem}.dict.dz")), encoder.finish().unwrap()).unwrap();
        } else {
            std::fs::write(dir.join(format!("{stem}.dict")), data).unwrap();
        }
        Dictionary { name: stem.to_string(), path: ifo }
    }

    #[test]
    fn looks_up_a_word_with_a_type_sequence() {
        let dir = TempDir::new().unwrap();
        let dict = dictionary(
            dir.path(),
            "en-de",
            "sametypesequence=h\n",
            &[("cat", b"<b>Katze</b><br>die Katze"), ("dog", b"<i>Hund</i>\n\n  der Hund  ")],
            false,
        );
        assert_eq!(dict.lookup("dog").unwrap(), vec!["Hund", "der Hund"]);
        assert_eq!(dict.lookup(" cat ").unwrap(), vec!["Katze", "die Katze"]);
    }

    #[test]
    fn unknown_and_blank_words_have_no_lines() {
        let dir = TempDir::new().unwrap();
        let dict = dictionary(dir.path(), "en-de", "sametypesequence=m\n", &[("cat", b"Katze")], false);
        assert!(dict.lookup("Cat").unwrap().is_empty());
        assert!(dict.lookup("   ").unwrap().is_empty());
    }

    #[test]
    fn reads_compressed_articles_with_typed_fields() {
        let dir = TempDir::new().unwrap();
        let article: &[u8] = b"mKatze\0g<span>feline</span>\0W\0\0\0\x02\xff\xfetend";
        let dict = dictionary(dir.path(), "en-de", "", &[("cat", article)], true);
        assert_eq!(dict.lookup("cat").unwrap(), vec!["Katze", "feline", "end"]);
    }

    #[test]
    fn missing_article_data_is_an_error() {
        let dir = TempDir::new().unwrap();
        let dict = dictionary(dir.path(), "en-de", "", &[("cat", b"mKatze")], false);
        std::fs::remove_file(dir.path().join("en-de.dict")).unwrap();
        let err = dict.lookup("cat").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Dictionary(path) if path == &dir.path().join("en-de.dict.dz")));
    }

    #[test]
    fn missing_info_file_is_an_error() {
        let dict = Dictionary { name: "gone".to_string(), path: PathBuf::from("/nonexistent/gone.ifo") };
        assert!(matches!(&*dict.lookup("cat").unwrap_err(), ErrorKind::Dictionary(_)));
    }

    #[rstest]
    #[case(false, &[b'w', b'o', b'r', b'd', 0, 0, 0, 0, 7, 0, 0, 0, 3])]
    #[case(true, &[b'w', b'o', b'r', b'd', 0, 0, 0, 0, 0, 0, 0, 0, 7, 0, 0, 0, 3])]
    fn index_offsets_follow_the_header(#[case] wide: bool, #[case] index: &[u8]) {
        assert_eq!(find(index, b"word", wide), vec![Entry { offset: 7, size: 3 }]);
    }

    #[test]
    fn truncated_index_stops_the_search() {
        assert!(find(b"word\0\0\0", b"word", false).is_empty());
    }

    #[test]
    fn header_defaults_to_narrow_untyped() {
        assert_eq!(Header::parse("bookname=x\n"), Header::default());
        let header = Header::parse("idxoffsetbits=64\nsametypesequence=tm\n");
        assert!(header.wide_offsets);
        assert_eq!(header.same_type_sequence.as_deref(), Some("tm"));
    }
}
