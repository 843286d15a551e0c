//! Chip / tag list input

use crate::binding::FieldHandle;
use crate::error::RenderResult;
use crate::view::WidgetView;
use stepform_schema::{ChipProps, FieldValue, Splitter};

/// Non-character keys the chip input reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Enter / Return
    Enter,
    /// Backspace
    Backspace,
}

/// Ordered token list with a text buffer
///
/// A token is committed when a splitter is typed or on blur. Tokens are keyed by
/// value: removal names the token, not its position. Once a commit is refused at
/// `max_items`, the held token stays in the buffer and further typing is ignored
/// until a chip is removed.
#[derive(Debug, Clone)]
pub struct ChipInput {
    handle: FieldHandle,
    props: ChipProps,
    buffer: String,
    holding: bool,
}

impl ChipInput {
    pub(crate) fn new(handle: FieldHandle, props: ChipProps) -> Self {
        Self {
            handle,
            props,
            buffer: String::new(),
            holding: false,
        }
    }

    /// Feed typed characters
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn input(&mut self, text: &str) -> RenderResult<()> {
        for c in text.chars() {
            let splits = self.props.splitters.contains(&Splitter::Char(c))
                || (c == '\n' && self.props.splitters.contains(&Splitter::Enter));
            if splits {
                self.commit()?;
                continue;
            }
            if self.holding && self.at_capacity_with(&self.chips()) {
                continue;
            }
            self.holding = false;
            self.buffer.push(c);
        }
        Ok(())
    }

    /// Handle a non-character key
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn key(&mut self, key: Key) -> RenderResult<()> {
        match key {
            Key::Enter if self.props.splitters.contains(&Splitter::Enter) => self.commit(),
            Key::Enter => Ok(()),
            Key::Backspace if self.buffer.is_empty() => {
                let mut chips = self.chips();
                if chips.pop().is_some() {
                    self.handle.set(FieldValue::List(chips))?;
                }
                Ok(())
            }
            Key::Backspace => {
                self.buffer.pop();
                if self.buffer.is_empty() {
                    self.holding = false;
                }
                Ok(())
            }
        }
    }

    /// Commit the buffer, if any text remains
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn commit(&mut self) -> RenderResult<()> {
        let token = self.buffer.trim().to_string();
        if token.is_empty() {
            self.buffer.clear();
            self.holding = false;
            return Ok(());
        }

        let mut chips = self.chips();
        if !self.props.allow_duplicates && chips.contains(&token) {
            self.buffer.clear();
            self.holding = false;
            return Ok(());
        }
        if self.at_capacity_with(&chips) {
            tracing::debug!(path = %self.handle.path(), "chip limit reached, holding buffer");
            self.holding = true;
            return Ok(());
        }

        chips.push(token);
        self.buffer.clear();
        self.holding = false;
        self.handle.set(FieldValue::List(chips))
    }

    /// Remove the first token equal to `value`
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn remove(&mut self, value: &str) -> RenderResult<bool> {
        let mut chips = self.chips();
        let Some(pos) = chips.iter().position(|c| c == value) else {
            return Ok(false);
        };
        chips.remove(pos);
        self.handle.set(FieldValue::List(chips))?;
        Ok(true)
    }

    /// Committed tokens
    #[must_use]
    pub fn chips(&self) -> Vec<String> {
        self.handle.value().as_list().map(<[String]>::to_vec).unwrap_or_default()
    }

    /// Uncommitted text
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    fn at_capacity_with(&self, chips: &[String]) -> bool {
        self.props.max_items.is_some_and(|max| chips.len() >= max)
    }

    pub(crate) fn blur(&mut self) -> RenderResult<()> {
        self.commit()?;
        self.handle.touch();
        Ok(())
    }

    pub(crate) fn handle(&self) -> &FieldHandle {
        &self.handle
    }

    pub(crate) fn view(&self) -> WidgetView {
        let chips = self.chips();
        WidgetView::Chips {
            at_capacity: self.at_capacity_with(&chips),
            chips,
            buffer: self.buffer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::LocalBinding;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use stepform_schema::{FieldPath, FormValueTree};

    fn chip_input(props: ChipProps) -> (ChipInput, Arc<LocalBinding>) {
        let binding = LocalBinding::new(FormValueTree::new().with("tags", Vec::<String>::new()).unwrap());
        (ChipInput::new(binding.handle(FieldPath::parse("tags").unwrap()), props), binding)
    }

    #[test]
    fn splitters_commit_and_blur_flushes() {
        let (mut chips, binding) = chip_input(ChipProps::default());
        chips.input("a,a,b").unwrap();
        assert_eq!(chips.chips(), vec!["a"]);
        assert_eq!(chips.buffer(), "b");

        chips.blur().unwrap();
        assert_eq!(chips.chips(), vec!["a", "b"]);
        assert!(binding.is_touched(&FieldPath::parse("tags").unwrap()));
    }

    #[test]
    fn enter_key_commits() {
        let (mut chips, _) = chip_input(ChipProps::default());
        chips.input("climate").unwrap();
        chips.key(Key::Enter).unwrap();
        assert_eq!(chips.chips(), vec!["climate"]);
    }

    #[test]
    fn enter_ignored_when_not_a_splitter() {
        let (mut chips, _) = chip_input(ChipProps {
            splitters: vec![Splitter::Char(';')],
            ..ChipProps::default()
        });
        chips.input("a b").unwrap();
        chips.key(Key::Enter).unwrap();
        assert!(chips.chips().is_empty());
        chips.input(";").unwrap();
        assert_eq!(chips.chips(), vec!["a b"]);
    }

    #[test]
    fn duplicates_kept_when_allowed() {
        let (mut chips, _) = chip_input(ChipProps {
            allow_duplicates: true,
            ..ChipProps::default()
        });
        chips.input("a,a,").unwrap();
        assert_eq!(chips.chips(), vec!["a", "a"]);
    }

    #[test]
    fn backspace_on_empty_buffer_removes_last() {
        let (mut chips, _) = chip_input(ChipProps::default());
        chips.input("x y z").unwrap();
        chips.key(Key::Backspace).unwrap();
        assert_eq!(chips.buffer(), "");
        assert_eq!(chips.chips(), vec!["x", "y"]);
        chips.key(Key::Backspace).unwrap();
        assert_eq!(chips.chips(), vec!["x"]);
    }

    #[test]
    fn max_items_holds_overflow_in_buffer() {
        let (mut chips, _) = chip_input(ChipProps {
            max_items: Some(2),
            ..ChipProps::default()
        });
        chips.input("a,b,c,d").unwrap();
        assert_eq!(chips.chips(), vec!["a", "b"]);
        assert_eq!(chips.buffer(), "c");
        assert!(matches!(chips.view(), WidgetView::Chips { at_capacity: true, .. }));

        chips.input(",e").unwrap();
        assert_eq!(chips.buffer(), "c");

        assert!(chips.remove("a").unwrap());
        chips.commit().unwrap();
        assert_eq!(chips.chips(), vec!["b", "c"]);
        assert_eq!(chips.buffer(), "");

        chips.input("f").unwrap();
        assert_eq!(chips.buffer(), "f");
    }

    #[test]
    fn remove_by_value() {
        let (mut chips, _) = chip_input(ChipProps::default());
        chips.input("a,b,c,").unwrap();
        assert!(chips.remove("b").unwrap());
        assert!(!chips.remove("zzz").unwrap());
        assert_eq!(chips.chips(), vec!["a", "c"]);
    }
}
