//! Statement boundary scanner
//!
//! Finds `;` terminators outside string literals, `$tag$` dollar-quoted
//! strings, quoted identifiers and comments. `CREATE [TEMP] TRIGGER` bodies
//! only end at `END;`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Quoted(char),
    /// Byte range of the opening `$tag$`, which is also the closing delimiter
    DollarQuoted(usize, usize),
    LineComment,
    BlockComment,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    start: usize,
    end: usize,
    terminated: bool,
    significant: bool,
}

/// Leading keywords and the most recent word of the statement being scanned.
#[derive(Debug, Default)]
struct Words {
    leading: Vec<String>,
    last: String,
    current: Option<usize>,
}

impl Words {
    fn start(&mut self, index: usize) {
        if self.current.is_none() {
            self.current = Some(index);
        }
    }

    fn finish(&mut self, sql: &str, index: usize) {
        let Some(start) = self.current.take() else {
            return;
        };
        let word = sql.get(start..index).unwrap_or_default().to_ascii_lowercase();
        if self.leading.len() < 3 {
            self.leading.push(word.clone());
        }
        self.last = word;
    }

    /// Other punctuation separates words and breaks keyword runs like `END;`
    fn punctuation(&mut self, sql: &str, index: usize) {
        self.finish(sql, index);
        self.last.clear();
    }

    fn in_trigger(&self) -> bool {
        match self.leading.as_slice() {
            [create, trigger, ..] if create == "create" && trigger == "trigger" => true,
            [create, temp, trigger]
                if create == "create"
                    && (temp == "temp" || temp == "temporary")
                    && trigger == "trigger" =>
            {
                true
            }
            _ => false,
        }
    }

    /// Whether a `;` at this point would be inside an unfinished trigger body
    fn holds_terminator(&self) -> bool {
        self.in_trigger() && self.last != "end"
    }

    fn reset(&mut self) {
        self.leading.clear();
        self.last.clear();
        self.current = None;
    }
}

struct Scan {
    segments: Vec<Segment>,
    state: State,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// End of the `$tag$` delimiter starting at `index`, if one starts there.
/// `$1` style parameters are not delimiters.
fn dollar_delimiter_end(sql: &str, index: usize) -> Option<usize> {
    let rest = sql.get(index + 1..)?;
    let tag_len = rest.find(|c: char| !(c.is_alphanumeric() || c == '_'))?;
    if !rest.get(tag_len..)?.starts_with('$') || rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(index + 1 + tag_len + 1)
}

fn scan(sql: &str) -> Scan {
    let mut segments = Vec::new();
    let mut state = State::Normal;
    let mut start = 0;
    let mut significant = false;
    let mut words = Words::default();
    let mut chars = sql.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match state {
            State::Normal if c == '$' && words.current.is_none() => {
                match dollar_delimiter_end(sql, index) {
                    Some(end) => {
                        words.punctuation(sql, index);
                        significant = true;
                        while chars.next_if(|&(i, _)| i < end).is_some() {}
                        state = State::DollarQuoted(index, end);
                    }
                    None => {
                        significant = true;
                        words.start(index);
                    }
                }
            }
            State::Normal => match c {
                '\'' | '"' | '`' => {
                    words.punctuation(sql, index);
                    significant = true;
                    state = State::Quoted(c);
                }
                '-' if next == Some('-') => {
                    words.finish(sql, index);
                    chars.next();
                    state = State::LineComment;
                }
                '/' if next == Some('*') => {
                    words.finish(sql, index);
                    chars.next();
                    state = State::BlockComment;
                }
                ';' => {
                    words.finish(sql, index);
                    if words.holds_terminator() {
                        words.punctuation(sql, index);
                        continue;
                    }
                    segments.push(Segment {
                        start,
                        end: index,
                        terminated: true,
                        significant,
                    });
                    start = index + c.len_utf8();
                    significant = false;
                    words.reset();
                }
                c if c.is_whitespace() => words.finish(sql, index),
                c if is_word_char(c) => {
                    significant = true;
                    words.start(index);
                }
                _ => {
                    significant = true;
                    words.punctuation(sql, index);
                }
            },
            State::Quoted(quote) => {
                if c == quote {
                    if next == Some(quote) {
                        chars.next();
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DollarQuoted(open, end) => {
                let delimiter = sql.get(open..end).unwrap_or("$$");
                let closes = c == '$'
                    && sql.get(index..).is_some_and(|rest| rest.starts_with(delimiter));
                if closes {
                    let close_end = index + delimiter.len();
                    while chars.next_if(|&(i, _)| i < close_end).is_some() {}
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if c == '*' && next == Some('/') {
                    chars.next();
                    state = State::Normal;
                }
            }
        }
    }

    if start < sql.len() {
        segments.push(Segment {
            start,
            end: sql.len(),
            terminated: false,
            significant,
        });
    }

    Scan { segments, state }
}

/// Whether `sql` ends with a complete statement: at least one `;` terminator
/// and nothing but whitespace or comments after the last one.
#[inline]
pub fn is_complete(sql: &str) -> bool {
    let Scan { segments, state } = scan(sql);
    if matches!(
        state,
        State::Quoted(_) | State::DollarQuoted(..) | State::BlockComment
    ) {
        return false;
    }

    match segments.last() {
        Some(last) if last.terminated => true,
        Some(last) => {
            !last.significant && segments.iter().rev().skip(1).any(|s| s.terminated)
        }
        None => false,
    }
}

/// Split `sql` into its non-empty statements, without terminators.
#[inline]
pub fn split(sql: &str) -> Vec<&str> {
    scan(sql)
        .segments
        .into_iter()
        .filter(|segment| segment.significant)
        .filter_map(|segment| sql.get(segment.start..segment.end))
        .map(str::trim)
        .collect()
}
