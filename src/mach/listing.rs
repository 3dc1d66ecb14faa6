use crate::error;
use crate::lang::{Error, Line, LineNumber, MaxValue, MAX_LINE_LEN};
use std::collections::btree_map::Values;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// ## The stored program
///
/// Numbered lines in order, kept as token streams. This is what
/// LIST, SAVE, RENUM and the compiler all read.

#[derive(Debug, Clone, Default)]
pub struct Listing {
    source: Arc<BTreeMap<u16, Line>>,
}

impl Listing {
    pub fn clear(&mut self) {
        self.source = Arc::default();
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Insert, replace, or (for an empty line) delete. Returns false
    /// when the line was rejected.
    pub fn insert(&mut self, line: Line) -> Result<(), Error> {
        let number = match line.number() {
            Some(number) => number,
            None => return Err(error!(InternalError; "direct line in listing")),
        };
        let source = Arc::make_mut(&mut self.source);
        if line.is_empty() {
            source.remove(&number);
        } else {
            source.insert(number, line);
        }
        Ok(())
    }

    pub fn get(&self, number: u16) -> Option<&Line> {
        self.source.get(&number)
    }

    pub fn lines(&self) -> Values<'_, u16, Line> {
        self.source.values()
    }

    /// Canonical text of a line range, one string per line.
    pub fn list(&self, from: u16, to: u16) -> Vec<String> {
        if from > to {
            return vec![];
        }
        self.source
            .range(from..=to)
            .map(|(_, line)| line.pretty())
            .collect()
    }

    /// Load a whole source text. Line numbers must strictly
    /// increase; a string left open at a line break swallows
    /// following non-digit-leading lines as its continuation, which
    /// is reported as a warning rather than an error.
    pub fn load_source(&mut self, source: &str) -> Result<Vec<Error>, Error> {
        let mut loaded = Listing::default();
        let mut warnings: Vec<Error> = vec![];
        let mut last_number: Option<u16> = None;
        let mut pending: Option<String> = None;
        let mut text_lines = source.lines().peekable();
        while pending.is_some() || text_lines.peek().is_some() {
            let text = match pending.take() {
                Some(text) => text,
                None => text_lines.next().unwrap_or("").to_string(),
            };
            if text.trim().is_empty() {
                continue;
            }
            if text.len() > MAX_LINE_LEN {
                return Err(error!(LineTooLong, last_number));
            }
            let mut text = text;
            let mut line = Line::new(&text);
            while line.unterminated() {
                match text_lines.peek() {
                    Some(next) if !next.trim_start().starts_with(|c: char| c.is_ascii_digit()) => {
                        text.push_str(text_lines.next().unwrap_or(""));
                        warnings.push(
                            error!(SyntaxError, line.number(); "unterminated string continues"),
                        );
                        line = Line::new(&text);
                    }
                    _ => {
                        warnings.push(
                            error!(SyntaxError, line.number(); "string closed at end of line"),
                        );
                        break;
                    }
                }
            }
            let number = match line.number() {
                Some(number) => number,
                None => return Err(error!(InvalidDirectCommand; "direct command in file")),
            };
            if let Some(last) = last_number {
                if number <= last {
                    return Err(
                        error!(SyntaxError, Some(number); "line numbers must increase"),
                    );
                }
            }
            last_number = Some(number);
            loaded.insert(line)?;
        }
        *self = loaded;
        Ok(warnings)
    }

    /// Merge another listing into this one, replacing lines that
    /// collide (CHAIN MERGE).
    pub fn merge(&mut self, other: &Listing) {
        let source = Arc::make_mut(&mut self.source);
        for (number, line) in other.source.iter() {
            source.insert(*number, line.clone());
        }
    }

    /// Renumber: lines in [old_start, keep) move to new_start,
    /// new_start+step, ...; every reference into that range follows.
    /// All validation happens before any mutation.
    pub fn renum(&mut self, new_start: u16, old_start: u16, step: u16, keep: u16) -> Result<(), Error> {
        if new_start < 1 || old_start < 1 || step < 1 {
            return Err(error!(ImproperArgument));
        }
        let existing: HashSet<u16> = self.source.keys().copied().collect();
        for (number, line) in self.source.iter() {
            for target in line.line_refs() {
                if !existing.contains(&target) {
                    return Err(error!(UndefinedLine, Some(*number)));
                }
            }
        }
        let mut changes: HashMap<u16, u16> = HashMap::default();
        let mut untouched_below: Option<u16> = None;
        let mut untouched_above: Option<u16> = None;
        let mut new_num: u32 = new_start as u32;
        for &number in self.source.keys() {
            if number < old_start {
                untouched_below = Some(number);
            } else if number >= keep {
                if untouched_above.is_none() {
                    untouched_above = Some(number);
                }
            } else {
                if new_num > LineNumber::max_value() as u32 {
                    return Err(error!(Overflow));
                }
                changes.insert(number, new_num as u16);
                new_num += step as u32;
            }
        }
        if let Some(below) = untouched_below {
            if new_start <= below {
                return Err(error!(ImproperArgument; "renumbered lines collide below"));
            }
        }
        if let Some(above) = untouched_above {
            if let Some(last) = changes.values().max() {
                if *last >= above {
                    return Err(error!(ImproperArgument; "renumbered lines collide above"));
                }
            }
        }
        let mut new_source: BTreeMap<u16, Line> = BTreeMap::default();
        for line in self.lines() {
            let line = line.renum(&changes);
            match line.number() {
                Some(number) => {
                    new_source.insert(number, line);
                }
                None => return Err(error!(InternalError)),
            }
        }
        self.source = Arc::from(new_source);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(lines: &[&str]) -> Listing {
        let mut l = Listing::default();
        l.load_source(&lines.join("\n")).unwrap();
        l
    }

    #[test]
    fn test_renum_shifts_refs() {
        let mut l = listing(&["10 GOTO 20", "20 PRINT \"A\""]);
        l.renum(100, 1, 10, 65535).unwrap();
        let out: Vec<String> = l.lines().map(|l| l.to_string()).collect();
        assert_eq!(out, vec!["100 GOTO 110", "110 PRINT \"A\""]);
    }

    #[test]
    fn test_renum_keep_boundary() {
        let mut l = listing(&["10 GOTO 500", "20 GOTO 10", "500 END"]);
        l.renum(100, 1, 10, 500).unwrap();
        let out: Vec<String> = l.lines().map(|l| l.to_string()).collect();
        assert_eq!(out, vec!["100 GOTO 500", "110 GOTO 100", "500 END"]);
    }

    #[test]
    fn test_renum_missing_target_fails_before_mutation() {
        let mut l = listing(&["10 GOTO 99", "20 END"]);
        assert!(l.renum(100, 1, 10, 65535).is_err());
        let out: Vec<String> = l.lines().map(|l| l.to_string()).collect();
        assert_eq!(out, vec!["10 GOTO 99", "20 END"]);
    }

    #[test]
    fn test_renum_collision_fails() {
        let mut l = listing(&["10 END", "20 END", "500 END"]);
        assert!(l.renum(490, 1, 10, 500).is_err());
    }

    #[test]
    fn test_load_rejects_unordered() {
        let mut l = Listing::default();
        assert!(l.load_source("20 END\n10 END").is_err());
    }

    #[test]
    fn test_load_continuation_heuristic() {
        let mut l = Listing::default();
        let warnings = l
            .load_source("10 PRINT \"BROKEN\nSTRING\"\n20 END")
            .unwrap();
        assert!(!warnings.is_empty());
        assert_eq!(l.len(), 2);
    }
}
