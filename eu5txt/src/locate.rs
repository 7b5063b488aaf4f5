//! Streaming block locator.
//!
//! Cuts the text of one record out of a save file without an index and
//! without parsing anything else. The source is read once, line by line;
//! brace depth is tracked from the record's opening line until it returns to
//! zero. Memory use is the lookback window plus the record itself.
//!
//! Records in a save look like this, with the identifying field a few lines
//! below the numbered line that opens the record:
//!
//! ```text
//! countries={
//! 	database={
//! 		200={
//! 			country_name="FRA"
//! 			...
//! 		}
//! 	}
//! }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::io::BufRead;
use std::ops::Range;

use crate::error::{ParseError, Result};
use crate::parser;
use crate::scan::{self, count_braces};
use crate::value::{Mapping, Value};

/// Smallest (and default) number of lines kept for finding the opening line
/// of a record above its marker.
pub const DEFAULT_LOOKBACK: usize = 10;

#[derive(Debug, Clone)]
pub struct LocateOptions {
    /// Lines kept behind the current line, the current line included.
    pub lookback: usize,
    /// Declarations entered in order before the search starts, e.g.
    /// `["countries", "database"]`. Empty searches the whole source.
    pub scope: Vec<String>,
    /// Keep reading after the first match and count every marker line.
    pub count_matches: bool,
}

impl Default for LocateOptions {
    fn default() -> Self {
        LocateOptions {
            lookback: DEFAULT_LOOKBACK,
            scope: Vec::new(),
            count_matches: false,
        }
    }
}

impl LocateOptions {
    pub fn within<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = path.into_iter().map(Into::into).collect();
        self
    }

    /// Values below [`DEFAULT_LOOKBACK`] are raised to it.
    pub fn lookback(mut self, lines: usize) -> Self {
        self.lookback = lines.max(DEFAULT_LOOKBACK);
        self
    }

    pub fn count_matches(mut self, count: bool) -> Self {
        self.count_matches = count;
        self
    }
}

/// The text of one located record.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedBlock {
    /// The record's lines, terminators included.
    pub text: String,
    /// 0-based line numbers `[start, end)` in the source.
    pub lines: Range<usize>,
    /// The source ended before the record closed.
    pub truncated: bool,
    /// Marker lines seen in scope, when counting was requested.
    pub marker_matches: Option<usize>,
}

impl LocatedBlock {
    pub fn parse(&self) -> Result<Mapping, ParseError> {
        parser::parse(&self.text)
    }

    /// The numeric key the record opens with, e.g. `"200"` for `200={`.
    pub fn record_id(&self) -> Option<&str> {
        let first = self.text.lines().next()?.trim();
        let (key, _) = first.split_once('=')?;
        let key = key.trim_end();
        (!key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())).then_some(key)
    }

    /// Parses the record and unwraps its id key, so `200={ gold=1 }` gives
    /// `{ gold=1 }`. Text without an id key comes back as a whole mapping;
    /// `None` means there was nothing to parse.
    pub fn parse_body(&self) -> Result<Option<Value>, ParseError> {
        let mut map = self.parse()?;
        if let Some(body) = self.record_id().and_then(|id| map.shift_remove(id)) {
            return Ok(Some(body));
        }
        Ok((!map.is_empty()).then_some(Value::Mapping(map)))
    }

    /// More than one marker line matched; only meaningful with counting on.
    pub fn is_ambiguous(&self) -> bool {
        self.marker_matches.is_some_and(|n| n > 1)
    }
}

/// Finds records in line-oriented script sources.
///
/// Every call makes its own single pass over the reader it is given; a
/// `Locator` holds no state between calls and can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    options: LocateOptions,
}

impl Locator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LocateOptions) -> Self {
        Locator { options }
    }

    pub fn options(&self) -> &LocateOptions {
        &self.options
    }

    pub fn within<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = self.options.within(path);
        self
    }

    pub fn lookback(mut self, lines: usize) -> Self {
        self.options = self.options.lookback(lines);
        self
    }

    pub fn count_matches(mut self, count: bool) -> Self {
        self.options = self.options.count_matches(count);
        self
    }

    /// Finds the record containing the first line `marker` accepts.
    ///
    /// The record's opening line is looked for in the lookback window: the
    /// nearest numbered `<id>={` line indented one tab less than the marker.
    /// Failing that, the marker line itself if it opens a record, and
    /// failing that, the whole window.
    pub fn find_record_by_marker<R, M>(&self, source: R, mut marker: M) -> Result<Option<LocatedBlock>>
    where
        R: BufRead,
        M: FnMut(&str) -> bool,
    {
        let lookback = self.options.lookback.max(DEFAULT_LOOKBACK);
        let mut lines = Lines::new(source);
        let mut gate = ScopeGate::new(&self.options.scope);
        let mut window: VecDeque<(usize, String)> = VecDeque::with_capacity(lookback);
        let mut collector: Option<Collector> = None;
        let mut found: Option<LocatedBlock> = None;
        let mut matches = 0usize;

        while let Some((index, line)) = lines.next_line()? {
            let state = gate.admit(&line);

            if let Some(c) = collector.as_mut() {
                c.push(index, &line);
                if c.is_done() {
                    found = collector.take().map(|c| c.finish(false));
                    if !self.options.count_matches {
                        break;
                    }
                }
                continue;
            }

            match state {
                Gate::Outside => continue,
                Gate::Closed => break,
                Gate::Inside { .. } => {}
            }

            let is_marker = marker(&line);
            if found.is_some() {
                if is_marker {
                    matches += 1;
                }
                continue;
            }

            if window.len() == lookback {
                window.pop_front();
            }
            window.push_back((index, line));
            if !is_marker {
                continue;
            }

            matches = 1;
            let start = record_start(&window);
            log::debug!(
                "Marker at line {}, record starts at line {}",
                index + 1,
                window[start].0 + 1
            );
            let c = Collector::seed(window.range(start..));
            if c.is_done() {
                found = Some(c.finish(false));
                if !self.options.count_matches {
                    break;
                }
            } else {
                collector = Some(c);
            }
        }

        if let Some(c) = collector {
            found = Some(c.finish(true));
        }
        if let Some(block) = found.as_mut().filter(|_| self.options.count_matches) {
            if matches > 1 {
                log::warn!(
                    "Marker matched {} times, using the record at line {}",
                    matches,
                    block.lines.start + 1
                );
            }
            block.marker_matches = Some(matches);
        }
        Ok(found)
    }

    /// Finds the block opened by the first line starting (after indentation)
    /// with `prefix`, e.g. `"metadata="`.
    pub fn find_section_by_declaration<R: BufRead>(
        &self,
        source: R,
        prefix: &str,
    ) -> Result<Option<LocatedBlock>> {
        self.find_declared(source, |line, _| line.trim_start().starts_with(prefix))
    }

    /// Finds the record declared as `<id>={`.
    ///
    /// With a scope, only direct children of the innermost scope block are
    /// considered, so a nested reference such as `links={ 12={ ... } }` is
    /// not mistaken for record `12`.
    pub fn find_record_by_id<R: BufRead>(
        &self,
        source: R,
        id: impl fmt::Display,
    ) -> Result<Option<LocatedBlock>> {
        let prefix = format!("{}={{", id);
        self.find_declared(source, |line, child_level| {
            child_level && line.trim_start().starts_with(&prefix)
        })
    }

    /// Iterates over every numbered `<id>={` record in scope.
    pub fn records<R: BufRead>(&self, source: R) -> Records<R> {
        Records {
            lines: Lines::new(source),
            gate: ScopeGate::new(&self.options.scope),
            finished: false,
        }
    }

    fn find_declared<R, F>(&self, source: R, mut is_start: F) -> Result<Option<LocatedBlock>>
    where
        R: BufRead,
        F: FnMut(&str, bool) -> bool,
    {
        let mut lines = Lines::new(source);
        let mut gate = ScopeGate::new(&self.options.scope);
        let mut collector: Option<Collector> = None;

        while let Some((index, line)) = lines.next_line()? {
            let state = gate.admit(&line);

            if let Some(c) = collector.as_mut() {
                c.push(index, &line);
                if c.is_done() {
                    return Ok(collector.take().map(|c| c.finish(false)));
                }
                continue;
            }

            let child_level = match state {
                Gate::Outside => continue,
                Gate::Closed => break,
                Gate::Inside { child_level } => child_level,
            };
            if !is_start(&line, child_level) {
                continue;
            }

            log::debug!("Declaration found at line {}", index + 1);
            let mut c = Collector::new();
            c.push(index, &line);
            if c.is_done() || is_scalar_declaration(&line, &c) {
                return Ok(Some(c.finish(false)));
            }
            collector = Some(c);
        }

        Ok(collector.map(|c| c.finish(true)))
    }
}

/// Finds a record by marker with the default options.
pub fn find_record_by_marker<R, M>(source: R, marker: M) -> Result<Option<LocatedBlock>>
where
    R: BufRead,
    M: FnMut(&str) -> bool,
{
    Locator::new().find_record_by_marker(source, marker)
}

/// Finds a declared section with the default options.
pub fn find_section_by_declaration<R: BufRead>(
    source: R,
    prefix: &str,
) -> Result<Option<LocatedBlock>> {
    Locator::new().find_section_by_declaration(source, prefix)
}

/// Iterator over the numbered records of a source, see [`Locator::records`].
pub struct Records<R> {
    lines: Lines<R>,
    gate: ScopeGate,
    finished: bool,
}

impl<R: BufRead> Records<R> {
    fn next_record(&mut self) -> Result<Option<LocatedBlock>> {
        let mut collector: Option<Collector> = None;

        while let Some((index, line)) = self.lines.next_line()? {
            let state = self.gate.admit(&line);

            if let Some(c) = collector.as_mut() {
                c.push(index, &line);
                if c.is_done() {
                    return Ok(collector.take().map(|c| c.finish(false)));
                }
                continue;
            }

            match state {
                Gate::Outside => continue,
                Gate::Closed => return Ok(None),
                Gate::Inside { child_level } => {
                    if !child_level || !scan::is_record_header(&line) {
                        continue;
                    }
                }
            }

            let mut c = Collector::new();
            c.push(index, &line);
            if c.is_done() {
                return Ok(Some(c.finish(false)));
            }
            collector = Some(c);
        }

        Ok(collector.map(|c| c.finish(true)))
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<LocatedBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

// -------------------------------------------------------------------------
// Internals
// -------------------------------------------------------------------------

/// Numbered lines of a source, terminators kept.
struct Lines<R> {
    source: R,
    next_index: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(source: R) -> Self {
        Lines {
            source,
            next_index: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        let mut line = String::new();
        if self.source.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let index = self.next_index;
        self.next_index += 1;
        Ok(Some((index, line)))
    }
}

enum Gate {
    /// Before the scope has been entered.
    Outside,
    /// In scope. `child_level` is set for lines directly inside the
    /// innermost scope block (always, when there is no scope).
    Inside { child_level: bool },
    /// The innermost scope block has closed.
    Closed,
}

/// Tracks entry into and exit from the configured scope.
struct ScopeGate {
    path: Vec<String>,
    entered: usize,
    depth: i64,
    opened: bool,
}

impl ScopeGate {
    fn new(path: &[String]) -> Self {
        ScopeGate {
            path: path.to_vec(),
            entered: 0,
            depth: 0,
            opened: false,
        }
    }

    fn admit(&mut self, line: &str) -> Gate {
        if self.path.is_empty() {
            return Gate::Inside { child_level: true };
        }

        if self.entered < self.path.len() {
            let declared = line
                .trim_start()
                .strip_prefix(self.path[self.entered].as_str())
                .is_some_and(|rest| rest.trim_start().starts_with('='));
            if declared {
                self.entered += 1;
                if self.entered == self.path.len() {
                    log::debug!("Entered scope {}", self.path.join("/"));
                    self.track(line);
                }
            }
            return Gate::Outside;
        }

        if self.is_closed() {
            return Gate::Closed;
        }
        let before = self.depth;
        self.track(line);
        if self.is_closed() {
            log::debug!("Left scope {}", self.path.join("/"));
            return Gate::Closed;
        }
        Gate::Inside {
            child_level: before == 1,
        }
    }

    fn track(&mut self, line: &str) {
        let braces = count_braces(line);
        self.depth += braces.net;
        if !self.opened {
            self.depth = self.depth.max(0);
            self.opened = braces.opens;
        }
    }

    fn is_closed(&self) -> bool {
        self.opened && self.depth <= 0
    }
}

/// Accumulates one record's lines until its braces balance.
#[derive(Default)]
struct Collector {
    text: String,
    lines: Range<usize>,
    depth: i64,
    opened: bool,
}

impl Collector {
    fn new() -> Self {
        Self::default()
    }

    /// Starts from lines read before the record's extent was known. Until
    /// a `{` has been counted the depth is not allowed below zero, so the
    /// tail of a previous record in the window is ignored.
    fn seed<'l>(lines: impl Iterator<Item = &'l (usize, String)>) -> Self {
        let mut c = Collector::new();
        for (index, line) in lines {
            c.push(*index, line);
            if !c.opened {
                c.depth = c.depth.max(0);
            }
        }
        c
    }

    fn push(&mut self, index: usize, line: &str) {
        if self.text.is_empty() {
            self.lines = index..index;
        }
        self.text.push_str(line);
        self.lines.end = index + 1;
        let braces = count_braces(line);
        self.depth += braces.net;
        self.opened |= braces.opens;
    }

    /// Done once the record's braces balance; a start that never opened a
    /// block ends when the enclosing block closes.
    fn is_done(&self) -> bool {
        if self.opened {
            self.depth <= 0
        } else {
            self.depth < 0
        }
    }

    fn finish(self, truncated: bool) -> LocatedBlock {
        if truncated {
            log::warn!(
                "Input ended inside the record starting at line {}, returning partial text",
                self.lines.start + 1
            );
        }
        LocatedBlock {
            text: self.text,
            lines: self.lines,
            truncated,
            marker_matches: None,
        }
    }
}

/// Index into `window` of the record's opening line; the marker line is the
/// last line of the window.
fn record_start(window: &VecDeque<(usize, String)>) -> usize {
    let last = window.len() - 1;
    let marker_line = &window[last].1;

    if let Some(target) = scan::indent_of(marker_line).checked_sub(1) {
        let header = window
            .iter()
            .rposition(|(_, l)| scan::indent_of(l) == target && scan::is_record_header(l));
        if let Some(pos) = header {
            return pos;
        }
    }
    if scan::is_record_header(marker_line) {
        return last;
    }
    log::debug!(
        "No record header within {} lines of the marker, using the whole window",
        window.len()
    );
    0
}

/// `key=value` on one line with no block, e.g. `date=1444.11.11`.
fn is_scalar_declaration(line: &str, collector: &Collector) -> bool {
    !collector.opened
        && line
            .split_once('=')
            .is_some_and(|(_, rest)| !rest.trim().is_empty())
}

#[cfg(test)]
#[path = "locate_tests.rs"]
mod tests;
