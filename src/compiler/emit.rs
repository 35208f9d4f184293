//! Text assembly for compiled statements

use super::config::{BlockLayout, CompileConfig};

/// One auxiliary named block in the `WITH` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub name: &'a str,
    /// Body with its references already rewritten
    pub body: String,
}

/// Join `blocks` and the trailing `statement` into a single `WITH` statement
///
/// With no blocks the statement is returned untouched.
pub fn assemble(blocks: &[Block<'_>], statement: String, config: &CompileConfig) -> String {
    if blocks.is_empty() {
        return statement;
    }

    let statement = prepare(&statement, config);
    let mut out = String::from("WITH ");

    match config.layout {
        BlockLayout::Pretty => {
            for (i, block) in blocks.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str(block.name);
                out.push_str(" AS (\n");
                out.push_str(&indent(prepare(&block.body, config), config.indent));
                out.push_str("\n)");
            }
            out.push('\n');
        }
        BlockLayout::Compact => {
            for (i, block) in blocks.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(block.name);
                out.push_str(" AS (");
                out.push_str(prepare(&block.body, config));
                out.push(')');
            }
            out.push(' ');
        }
    }

    out.push_str(statement);
    out
}

fn prepare<'b>(body: &'b str, config: &CompileConfig) -> &'b str {
    if config.trim_bodies {
        body.trim()
    } else {
        body
    }
}

fn indent(body: &str, width: usize) -> String {
    if width == 0 {
        return body.to_string();
    }
    let pad = " ".repeat(width);
    body.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
