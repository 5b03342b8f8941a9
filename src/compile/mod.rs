//! Compile the template into a program that can be executed by the renderer.
//!
//! This process has three parts:
//! - The lexer splits the template source into text and constructs.
//! - The HTML scanner turns text into literal and whitespace instructions.
//! - The compiler emits instructions for constructs, back-patching the jump
//!   targets of conditionals and loops once their end is known.

mod html;
mod lex;
pub mod pipe;

use std::sync::Arc;

use crate::compile::html::{Edge, Html};
use crate::compile::lex::{Construct, Lexer, Tag, Token};
use crate::types::program::{Instr, Program, FIXME};
use crate::types::span::Span;
use crate::{Error, Result};

/// Compile a template into a program.
pub fn template(source: &str) -> Result<Program> {
    let source: Arc<str> = Arc::from(source);
    let instrs = Compiler::new(&source).compile()?;
    Ok(Program { source, instrs })
}

/// A compiler that constructs a program from the token stream.
struct Compiler<'source> {
    source: &'source Arc<str>,
    instrs: Vec<Instr>,
    html: Html,
    blocks: Vec<Block>,
}

/// An open `if` or `foreach` block.
struct Block {
    kind: BlockKind,
    /// The index of the first instruction of the block.
    start: usize,
    /// A test that jumps to the next branch.
    pending: Option<usize>,
    /// Jumps from the end of each branch to the end of the block.
    exits: Vec<usize>,
    /// The HTML depth when the block was opened.
    depth: usize,
    span: Span,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Foreach,
}

impl BlockKind {
    fn human(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Foreach => "foreach",
        }
    }
}

impl<'source> Compiler<'source> {
    fn new(source: &'source Arc<str>) -> Self {
        Self {
            source,
            instrs: Vec::new(),
            html: Html::new(),
            blocks: Vec::new(),
        }
    }

    fn compile(mut self) -> Result<Vec<Instr>> {
        let source = self.source;
        let mut tokens = Lexer::new(source).peekable();
        while let Some(token) = tokens.next() {
            match token {
                Token::Text(text) => {
                    let right = match tokens.peek() {
                        Some(_) => Edge::Construct,
                        None => Edge::End,
                    };
                    self.html.scan(&text, right, &mut self.instrs);
                }
                Token::Construct(c) => {
                    self.compile_construct(c)?;
                    self.html.construct();
                }
            }
        }
        if let Some(block) = self.blocks.last() {
            return Err(Error::compile(
                format!("unclosed `{}` block", block.kind.human()),
                self.source,
                block.span,
            ));
        }
        self.html.close_to(0, &mut self.instrs);
        self.fill_space_depths();
        Ok(self.instrs)
    }

    fn compile_construct(&mut self, c: Construct<'_>) -> Result<()> {
        match c.tag {
            Tag::Eval | Tag::Raw => {
                let depth = self.html.depth();
                self.push(Instr::Eval {
                    pipe: pipe::parse(c.content, c.offset),
                    raw: c.tag == Tag::Raw,
                    depth,
                });
            }

            Tag::If { negate } => {
                let j = self.push(Instr::Test {
                    pipe: pipe::parse(c.content, c.offset),
                    negate,
                    target: FIXME,
                });
                self.open(BlockKind::If, j, Some(j), c.span);
            }

            Tag::ElseIf { .. } | Tag::Else => {
                let depth = match self.blocks.last() {
                    Some(b) if b.kind == BlockKind::If && b.pending.is_some() => b.depth,
                    _ => {
                        let name = if c.tag == Tag::Else { "else" } else { "elseif" };
                        return Err(self.unexpected(name, c.span));
                    }
                };
                self.html.close_to(depth, &mut self.instrs);
                let exit = self.push(Instr::Jump(FIXME));
                let next = match c.tag {
                    Tag::ElseIf { negate } => Some(Instr::Test {
                        pipe: pipe::parse(c.content, c.offset),
                        negate,
                        target: FIXME,
                    }),
                    _ => None,
                };
                let block = self.blocks.last_mut().map(|b| {
                    b.exits.push(exit);
                    b.pending.take()
                });
                if let Some(Some(j)) = block {
                    self.update_jump(j);
                }
                if let Some(instr) = next {
                    let j = self.push(instr);
                    if let Some(b) = self.blocks.last_mut() {
                        b.pending = Some(j);
                    }
                }
            }

            Tag::Foreach => {
                let j = self.push(Instr::Iterate {
                    pipe: pipe::parse(c.content, c.offset),
                    target: FIXME,
                });
                self.open(BlockKind::Foreach, j, None, c.span);
            }

            Tag::Close => {
                let block = match self.blocks.pop() {
                    Some(b) if b.kind.human() == c.content => b,
                    _ => return Err(self.unexpected(&format!("/{}", c.content), c.span)),
                };
                self.html.close_to(block.depth, &mut self.instrs);
                match block.kind {
                    BlockKind::If => {
                        for j in block.exits.into_iter().chain(block.pending) {
                            self.update_jump(j);
                        }
                    }
                    BlockKind::Foreach => {
                        self.update_jump(block.start);
                        self.push(Instr::IterateEnd(block.start + 1));
                    }
                }
            }

            Tag::Comment => {}
        }
        Ok(())
    }

    fn open(&mut self, kind: BlockKind, start: usize, pending: Option<usize>, span: Span) {
        self.blocks.push(Block {
            kind,
            start,
            pending,
            exits: Vec::new(),
            depth: self.html.depth(),
            span,
        });
    }

    fn unexpected(&self, name: &str, span: Span) -> Error {
        Error::compile(format!("unexpected `{name}` block"), self.source, span)
    }

    /// Whitespace takes the depth of the next literal or expression.
    fn fill_space_depths(&mut self) {
        let mut next = 0;
        for instr in self.instrs.iter_mut().rev() {
            match instr {
                Instr::Literal { depth, .. } | Instr::Eval { depth, .. } => next = *depth,
                Instr::Space { depth, .. } => *depth = next,
                _ => {}
            }
        }
    }

    fn update_jump(&mut self, i: usize) {
        let n = self.instrs.len();
        let j = match &mut self.instrs[i] {
            Instr::Jump(j) | Instr::Test { target: j, .. } | Instr::Iterate { target: j, .. } => j,
            _ => panic!("not a jump instr"),
        };
        *j = n;
    }

    fn push(&mut self, instr: Instr) -> usize {
        let i = self.instrs.len();
        self.instrs.push(instr);
        i
    }
}
