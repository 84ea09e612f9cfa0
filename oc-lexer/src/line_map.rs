//! Tracks GNU cpp `# <line> "<file>"` markers (spec.md §12, grounded on
//! `cppstrtok.cpp`'s `# %d "%[^"]*"` directive handling) so that source
//! positions reported in diagnostics refer to the original, pre-`cpp`
//! file and line, not the flattened preprocessor output.

use oc_diagnostics::{FileId, FileTable, MAIN_FILE};

#[derive(Debug, Clone, Copy)]
struct Segment {
    physical_start: u32,
    file: FileId,
    logical_start: u32,
}

#[derive(Debug)]
pub struct LineMap {
    segments: Vec<Segment>,
}

impl LineMap {
    pub fn new(main_file_name: &str, files: &mut FileTable) -> Self {
        let main = files.intern(main_file_name);
        debug_assert_eq!(main, MAIN_FILE);
        LineMap { segments: vec![Segment { physical_start: 1, file: main, logical_start: 1 }] }
    }

    /// Parses a `# <line> "<file>"` directive (any trailing GCC flag
    /// digits are ignored) observed at physical line `marker_physical_line`,
    /// registering that physical line `marker_physical_line + 1` onward is
    /// logical line `<line>` of `<file>`.
    pub fn record_marker(&mut self, text: &str, marker_physical_line: u32, files: &mut FileTable) {
        let rest = text.trim_start_matches('#').trim_start();
        let mut parts = rest.splitn(2, char::is_whitespace);
        let Some(line_str) = parts.next() else { return };
        let Ok(logical_start) = line_str.parse::<u32>() else { return };
        let rest = parts.next().unwrap_or("").trim_start();
        let file = if let Some(rest) = rest.strip_prefix('"') {
            let name = rest.split('"').next().unwrap_or("");
            files.intern(name)
        } else {
            self.segments.last().map(|s| s.file).unwrap_or(MAIN_FILE)
        };
        self.segments.push(Segment { physical_start: marker_physical_line + 1, file, logical_start });
    }

    /// Maps a physical (file, line) position in the post-`cpp` byte
    /// stream to the logical (file, line) it was generated from.
    pub fn resolve(&self, physical_line: u32) -> (FileId, u32) {
        let seg = self
            .segments
            .iter()
            .rev()
            .find(|s| s.physical_start <= physical_line)
            .expect("segments always has an initial entry at line 1");
        let delta = physical_line - seg.physical_start;
        (seg.file, seg.logical_start + delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_through_an_include_and_back() {
        let mut files = FileTable::new();
        let mut map = LineMap::new("main.oc", &mut files);
        // physical lines 1-2: main.oc, lines 1-2
        // physical line 3: marker says "included.oc" starts at line 1
        map.record_marker("# 1 \"included.oc\"", 3, &mut files);
        // physical line 4: included.oc line 1
        // physical line 5: marker says back to main.oc at line 3
        map.record_marker("# 3 \"main.oc\"", 5, &mut files);

        assert_eq!(map.resolve(2).1, 2);
        let (included_file, included_line) = map.resolve(4);
        assert_eq!(included_line, 1);
        assert_ne!(included_file, MAIN_FILE);
        assert_eq!(map.resolve(6).1, 3);
    }
}
