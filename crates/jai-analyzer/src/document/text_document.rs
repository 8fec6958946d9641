use tower_lsp::lsp_types::*;

use crate::definition::{NormalizedPath, normalize_fs_path};

/// Snapshot of a single open text document.
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Url,
    /// Normalized file path, when the URI is a `file://` URI.
    pub path: Option<NormalizedPath>,
    pub text: String,
    pub version: i32,
    /// Line start byte offsets, rebuilt on every mutation.
    line_offsets: Vec<usize>,
}

impl Document {
    pub fn new(
        uri: Url,
        text: String,
        version: i32,
    ) -> Self {
        let line_offsets = compute_line_offsets(&text);
        let path = uri.to_file_path().ok().map(|path| normalize_fs_path(&path));
        Self {
            uri,
            path,
            text,
            version,
            line_offsets,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }

    /// Text of a 0-based line without its line terminator.
    pub fn line_text(
        &self,
        line: usize,
    ) -> Option<&str> {
        let start = *self.line_offsets.get(line)?;
        let end = self.line_offsets.get(line + 1).copied().unwrap_or(self.text.len());
        Some(self.text[start..end].trim_end_matches('\n').trim_end_matches('\r'))
    }

    /// Convert an LSP `Position` (UTF-16 columns) to a byte offset.
    pub fn offset_of(
        &self,
        pos: Position,
    ) -> Option<usize> {
        let line = pos.line as usize;
        let line_start = *self.line_offsets.get(line)?;
        let line_end = self.line_offsets.get(line + 1).copied().unwrap_or(self.text.len());

        let mut utf16_offset: u32 = 0;
        let mut byte_offset = line_start;
        for ch in self.text[line_start..line_end].chars() {
            if utf16_offset >= pos.character {
                break;
            }
            utf16_offset += ch.len_utf16() as u32;
            byte_offset += ch.len_utf8();
        }
        Some(byte_offset)
    }

    /// Start of the identifier touching `pos`, in UTF-16 columns.
    ///
    /// The cursor may sit anywhere inside the identifier or right after its
    /// last character. Returns `None` when no identifier touches `pos`.
    pub fn identifier_start(
        &self,
        pos: Position,
    ) -> Option<Position> {
        let line_text = self.line_text(pos.line as usize)?;
        let chars: Vec<char> = line_text.chars().collect();

        let mut cursor = chars.len();
        let mut utf16_count: u32 = 0;
        for (i, &ch) in chars.iter().enumerate() {
            if utf16_count >= pos.character {
                cursor = i;
                break;
            }
            utf16_count += ch.len_utf16() as u32;
        }

        let on_identifier = chars.get(cursor).is_some_and(|&ch| is_identifier_char(ch));
        let after_identifier = cursor > 0 && is_identifier_char(chars[cursor - 1]);
        if !on_identifier && !after_identifier {
            return None;
        }

        let mut start = if on_identifier { cursor } else { cursor - 1 };
        while start > 0 && is_identifier_char(chars[start - 1]) {
            start -= 1;
        }

        let character = chars[..start].iter().map(|c| c.len_utf16() as u32).sum();
        Some(Position::new(pos.line, character))
    }

    pub fn set_content(
        &mut self,
        text: String,
        version: i32,
    ) {
        self.text = text;
        self.version = version;
        self.line_offsets = compute_line_offsets(&self.text);
    }

    /// Apply incremental or full-content changes in order.
    pub fn apply_changes(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) {
        for change in changes {
            match change.range {
                Some(range) => {
                    if let (Some(start), Some(end)) = (self.offset_of(range.start), self.offset_of(range.end))
                        && start <= end
                    {
                        self.text.replace_range(start..end, &change.text);
                    }
                },
                None => self.text = change.text,
            }
            self.line_offsets = compute_line_offsets(&self.text);
        }
        self.version = version;
    }
}

fn compute_line_offsets(text: &str) -> Vec<usize> {
    let mut offsets = vec![0usize];
    offsets.extend(text.bytes().enumerate().filter(|(_, byte)| *byte == b'\n').map(|(i, _)| i + 1));
    offsets
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
#[path = "../../tests/src/document/text_document_tests.rs"]
mod tests;
