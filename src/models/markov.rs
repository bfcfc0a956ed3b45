use anyhow::Result;
use std::collections::HashMap;

use super::GenerativeModel;

pub const MARKOV_MODEL_ID: &str = "markov";

/// Offline generative model that walks a word-bigram chain built from the
/// prompt itself. Successors are taken round-robin, so the output for a given
/// prompt and length never changes.
#[derive(Debug, Clone)]
pub struct MarkovModel {
    length: usize,
}

impl MarkovModel {
    #[inline]
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl GenerativeModel for MarkovModel {
    fn model_id(&self) -> &str {
        MARKOV_MODEL_ID
    }

    fn prompt(&self, text: &str) -> Result<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let Some(&first) = words.first() else {
            return Ok(String::new());
        };

        let mut transitions: HashMap<&str, Vec<&str>> = HashMap::new();
        for pair in words.windows(2) {
            transitions.entry(pair[0]).or_default().push(pair[1]);
        }

        let mut visits: HashMap<&str, usize> = HashMap::new();
        let mut output = Vec::with_capacity(self.length);
        let mut current = first;
        output.push(current);

        while output.len() < self.length {
            let Some(successors) = transitions.get(current) else {
                break;
            };
            let visit = visits.entry(current).or_insert(0);
            let next = successors[*visit % successors.len()];
            *visit += 1;

            output.push(next);
            current = next;
        }

        Ok(output.join(" "))
    }
}
