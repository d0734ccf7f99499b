//! Splits an assistant reply into display blocks.

use serde::Serialize;

const TITLE_MARKERS: [&str; 2] = ["مذكرة", "دفوع"];
const ARTICLE_MARKER: &str = "المادة";
const WARNING_MARKERS: [&str; 2] = ["تحذير", "ملاحظة هامة"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Title,
    Article,
    Section,
    List,
    Warning,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

impl FormattedBlock {
    fn new(kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            items: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Formatter {
    blocks: Vec<FormattedBlock>,
    section: Option<FormattedBlock>,
    loose_items: Vec<String>,
}

impl Formatter {
    fn push(&mut self, block: FormattedBlock) {
        self.flush_loose_items();
        self.blocks.push(block);
    }

    /// List items seen outside any section become their own list block.
    fn flush_loose_items(&mut self) {
        if !self.loose_items.is_empty() {
            let mut list = FormattedBlock::new(BlockKind::List, "");
            list.items = std::mem::take(&mut self.loose_items);
            self.blocks.push(list);
        }
    }

    fn close_section(&mut self) {
        if let Some(section) = self.section.take() {
            self.blocks.push(section);
        }
    }

    fn line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            return;
        }

        if TITLE_MARKERS.iter().any(|m| line.contains(m)) {
            self.push(FormattedBlock::new(BlockKind::Title, line));
        } else if line.contains(ARTICLE_MARKER) {
            self.push(FormattedBlock::new(BlockKind::Article, line));
        } else if let Some((head, tail)) = line.split_once(':') {
            self.close_section();
            self.flush_loose_items();
            self.section = Some(FormattedBlock::new(
                BlockKind::Section,
                format!("{}:{}", head.trim(), tail.trim()),
            ));
        } else if let Some(item) = line.strip_prefix('-').or_else(|| line.strip_prefix('•')) {
            let item = item.trim().to_string();
            match self.section.as_mut() {
                Some(section) => section.items.push(item),
                None => self.loose_items.push(item),
            }
        } else if WARNING_MARKERS.iter().any(|m| line.contains(m)) {
            self.push(FormattedBlock::new(BlockKind::Warning, line));
        } else {
            self.close_section();
            self.push(FormattedBlock::new(BlockKind::Text, line));
        }
    }

    fn finish(mut self) -> Vec<FormattedBlock> {
        self.close_section();
        self.flush_loose_items();
        self.blocks
    }
}

/// Classify each non-blank line of `text`.
///
/// Titles, articles and warnings are emitted as they appear. A line with `:`
/// opens a section that collects the following `-` / `•` lines as items and is
/// closed by the next section or plain text line.
pub fn format_legal_content(text: &str) -> Vec<FormattedBlock> {
    let mut formatter = Formatter::default();
    for line in text.lines() {
        formatter.line(line);
    }
    formatter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(blocks: &[FormattedBlock]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn classifies_memo_reply() {
        let reply = "مذكرة دفاع في الدعوى رقم 12\n\
                     \n\
                     الوقائع: تتلخص فيما يلي\n\
                     - تم تحرير العقد في 2020\n\
                     • أخل المدعى عليه بالتزامه\n\
                     وفقاً لنص المادة 147 من القانون المدني\n\
                     تحذير يجب تقديم المستندات قبل الجلسة\n\
                     وفي الختام نلتمس الحكم بالطلبات";
        let blocks = format_legal_content(reply);
        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Title,
                BlockKind::Article,
                BlockKind::Warning,
                BlockKind::Section,
                BlockKind::Text,
            ]
        );
        let section = &blocks[3];
        assert_eq!(section.content, "الوقائع:تتلخص فيما يلي");
        assert_eq!(
            section.items,
            vec!["تم تحرير العقد في 2020", "أخل المدعى عليه بالتزامه"]
        );
    }

    #[test]
    fn new_section_closes_previous_one() {
        let blocks = format_legal_content("أولاً: الشكل\n- بند\nثانياً: الموضوع\n- بند آخر");
        assert_eq!(kinds(&blocks), vec![BlockKind::Section, BlockKind::Section]);
        assert_eq!(blocks[0].items, vec!["بند"]);
        assert_eq!(blocks[1].items, vec!["بند آخر"]);
    }

    #[test]
    fn items_without_section_form_a_list() {
        let blocks = format_legal_content("- أول\n- ثاني\nنص عادي");
        assert_eq!(kinds(&blocks), vec![BlockKind::List, BlockKind::Text]);
        assert_eq!(blocks[0].items, vec!["أول", "ثاني"]);
    }

    #[test]
    fn blank_input_has_no_blocks() {
        assert!(format_legal_content("  \n\n").is_empty());
    }
}
