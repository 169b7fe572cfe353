//! ASCII rendering of trie structure for debugging.

#[derive(Debug, Clone)]
pub struct TextTree {
    text: String,
    children: Vec<TextTree>,
}

impl TextTree {
    pub fn new(text: impl Into<String>, children: Vec<TextTree>) -> Self {
        Self {
            text: text.into(),
            children,
        }
    }

    pub fn leaf(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        render_node(&mut out, "", self);
        out
    }
}

fn render_node(out: &mut String, prefix: &str, node: &TextTree) {
    out.push_str(&node.text);
    let Some((first, rest)) = node.children.split_first() else {
        out.push('\n');
        return;
    };

    let pad = " ".repeat(node.text.chars().count());
    let child_prefix = format!("{}{}", prefix, pad);
    if rest.is_empty() {
        out.push_str("--");
        render_node(out, &format!("{}  ", child_prefix), first);
        return;
    }

    out.push_str("+-");
    let branch_prefix = format!("{}| ", child_prefix);
    render_node(out, &branch_prefix, first);
    for (i, child) in rest.iter().enumerate() {
        out.push_str(&child_prefix);
        if i + 1 < rest.len() {
            out.push_str("+-");
            render_node(out, &branch_prefix, child);
        } else {
            out.push_str("\\-");
            render_node(out, &format!("{}  ", child_prefix), child);
        }
    }
}
