//! Sliding-window context assembly.
//!
//! Walks the conversation from newest to oldest, accumulating content length.
//! A message is kept while the running total *including* that message stays
//! strictly below the budget. Once the threshold is crossed every older
//! message is excluded as well, so the result is always a chronological suffix
//! of the input.
//!
//! # Determinism
//!
//! Assembly is a pure function of its inputs. Feeding the output back in with
//! the same budget returns it unchanged.

use chatrelay_core::message::{ChatMessage, Message, Role};

/// Length of a message body in UTF-16 code units.
///
/// Characters outside the Basic Multilingual Plane (most emoji) count as two.
pub fn content_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Anything with a role and a text body can be windowed.
pub trait ContextEntry {
    fn role(&self) -> Role;
    fn content(&self) -> &str;
}

impl ContextEntry for Message {
    fn role(&self) -> Role {
        self.role
    }

    fn content(&self) -> &str {
        &self.content
    }
}

impl ContextEntry for ChatMessage {
    fn role(&self) -> Role {
        self.role
    }

    fn content(&self) -> &str {
        &self.content
    }
}

/// The selected window, ready for a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    /// Kept messages, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Cumulative content length of the kept messages.
    pub total_chars: usize,
    /// Number of older messages left out.
    pub dropped: usize,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// The context assembler. Stateless apart from its budget; create once, reuse.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    budget: usize,
}

impl ContextAssembler {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Select the most recent messages of `conversation` (oldest first) that
    /// fit in the budget.
    pub fn assemble<E: ContextEntry>(&self, conversation: &[E]) -> AssembledContext {
        let mut running = 0usize;
        let mut kept: Vec<ChatMessage> = Vec::new();

        for entry in conversation.iter().rev() {
            running += content_len(entry.content());
            if running >= self.budget {
                break;
            }
            kept.push(ChatMessage {
                role: entry.role(),
                content: entry.content().to_string(),
            });
        }

        kept.reverse();
        let total_chars = kept.iter().map(|m| content_len(&m.content)).sum();
        let dropped = conversation.len() - kept.len();

        AssembledContext {
            messages: kept,
            total_chars,
            dropped,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn msgs(sizes: &[usize]) -> Vec<Message> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let body = "x".repeat(*n);
                if i % 2 == 0 {
                    Message::user(body)
                } else {
                    Message::assistant(body)
                }
            })
            .collect()
    }

    fn sizes(ctx: &AssembledContext) -> Vec<usize> {
        ctx.messages.iter().map(|m| content_len(&m.content)).collect()
    }

    #[test]
    fn everything_fits() {
        let ctx = ContextAssembler::new(100).assemble(&msgs(&[10, 20, 30]));
        assert_eq!(sizes(&ctx), vec![10, 20, 30]);
        assert_eq!(ctx.total_chars, 60);
        assert_eq!(ctx.dropped, 0);
    }

    #[test]
    fn equal_sizes_keep_only_newest() {
        // Cumulative sizes newest-first are 5, 10, 15; only 5 < 10.
        let ctx = ContextAssembler::new(10).assemble(&msgs(&[5, 5, 5]));
        assert_eq!(sizes(&ctx), vec![5]);
        assert_eq!(ctx.dropped, 2);
    }

    #[test]
    fn oversized_newest_yields_empty() {
        let ctx = ContextAssembler::new(10).assemble(&msgs(&[1, 1, 10]));
        assert!(ctx.is_empty());
        assert_eq!(ctx.dropped, 3);
    }

    #[test]
    fn exact_budget_is_excluded() {
        let ctx = ContextAssembler::new(10).assemble(&msgs(&[4, 6]));
        assert_eq!(sizes(&ctx), vec![6]);
    }

    #[test]
    fn crossing_threshold_excludes_all_older() {
        // 3 + 8 = 11 crosses the budget; the tiny oldest message is not
        // reconsidered even though it would fit on its own.
        let ctx = ContextAssembler::new(11).assemble(&msgs(&[1, 8, 3]));
        assert_eq!(sizes(&ctx), vec![3]);
    }

    #[test]
    fn output_is_chronological_suffix() {
        let input = msgs(&[7, 3, 2, 4, 1]);
        let ctx = ContextAssembler::new(9).assemble(&input);
        let n = ctx.messages.len();
        let tail: Vec<ChatMessage> = input[input.len() - n..].iter().map(Message::to_chat).collect();
        assert_eq!(ctx.messages, tail);
        assert!(ctx.total_chars < 9);
    }

    #[test]
    fn roles_are_preserved() {
        let input = vec![Message::user("question"), Message::assistant("answer")];
        let ctx = ContextAssembler::new(1000).assemble(&input);
        assert_eq!(ctx.messages[0].role, Role::User);
        assert_eq!(ctx.messages[1].role, Role::Assistant);
    }

    #[test]
    fn idempotent() {
        let assembler = ContextAssembler::new(12);
        let once = assembler.assemble(&msgs(&[3, 5, 2, 4, 4]));
        let twice = assembler.assemble(&once.messages);
        assert_eq!(once.messages, twice.messages);
        assert_eq!(twice.dropped, 0);
    }

    #[test]
    fn empty_input_and_zero_budget() {
        let empty: Vec<Message> = Vec::new();
        assert!(ContextAssembler::new(10).assemble(&empty).is_empty());
        assert!(ContextAssembler::new(0).assemble(&msgs(&[0])).is_empty());
    }

    #[test]
    fn length_counts_utf16_code_units() {
        assert_eq!(content_len("héllo"), 5);
        assert_eq!(content_len("日本語"), 3);
        assert_eq!(content_len("😀😀😀"), 6);
        let input = vec![Message::user("日本語")];
        assert_eq!(ContextAssembler::new(4).assemble(&input).messages.len(), 1);
    }

    #[test]
    fn astral_plane_text_counts_double() {
        // Three emoji are six units, which reaches a budget of 5.
        let input = vec![Message::user("😀😀😀")];
        let ctx = ContextAssembler::new(5).assemble(&input);
        assert!(ctx.is_empty());
        assert_eq!(ctx.dropped, 1);

        let ctx = ContextAssembler::new(7).assemble(&input);
        assert_eq!(ctx.messages.len(), 1);
        assert_eq!(ctx.total_chars, 6);
    }
}
