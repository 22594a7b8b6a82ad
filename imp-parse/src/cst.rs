#![forbid(unsafe_code)]

//! Concrete syntax tree.
//!
//! Nodes live in a flat arena and are addressed by index. Operator and
//! punctuation tokens that carry meaning (binary operators, `!`, the parts of
//! an argument list or a parenthesized expression) are kept as leaf nodes;
//! braces, statement terminators and assertion commas are not.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    TopDecl,
    Assertion,
    Command,
    Assign,
    AssignOp,
    CmdSkip,

    ImpliesE,
    OrE,
    AndE,
    NegE,
    CompE,
    BinArithE,
    UnaryExpr,
    PredicateApp,
    ArgList,
    ParenthesizedFormula,
    ParenthesizedArithExp,

    LitBool,
    LitNumber,
    Name,

    LogicOp,
    CompareOp,
    ArithOp,
    Bang,
    LParen,
    RParen,
    Comma,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::TopDecl => "TopDecl",
            NodeKind::Assertion => "Assertion",
            NodeKind::Command => "Command",
            NodeKind::Assign => "Assign",
            NodeKind::AssignOp => "AssignOp",
            NodeKind::CmdSkip => "CmdSkip",
            NodeKind::ImpliesE => "ImpliesE",
            NodeKind::OrE => "OrE",
            NodeKind::AndE => "AndE",
            NodeKind::NegE => "NegE",
            NodeKind::CompE => "CompE",
            NodeKind::BinArithE => "BinArithE",
            NodeKind::UnaryExpr => "UnaryExpr",
            NodeKind::PredicateApp => "PredicateApp",
            NodeKind::ArgList => "ArgList",
            NodeKind::ParenthesizedFormula => "ParenthesizedFormula",
            NodeKind::ParenthesizedArithExp => "ParenthesizedArithExp",
            NodeKind::LitBool => "LitBool",
            NodeKind::LitNumber => "LitNumber",
            NodeKind::Name => "Name",
            NodeKind::LogicOp => "LogicOp",
            NodeKind::CompareOp => "CompareOp",
            NodeKind::ArithOp => "ArithOp",
            NodeKind::Bang => "!",
            NodeKind::LParen => "(",
            NodeKind::RParen => ")",
            NodeKind::Comma => ",",
        }
    }

    /// Whether a node of this kind denotes a boolean-valued expression.
    pub fn is_formula(self) -> bool {
        matches!(
            self,
            NodeKind::ImpliesE
                | NodeKind::OrE
                | NodeKind::AndE
                | NodeKind::NegE
                | NodeKind::CompE
                | NodeKind::PredicateApp
                | NodeKind::ParenthesizedFormula
                | NodeKind::LitBool
        )
    }
}

#[derive(Clone, Debug)]
struct SyntaxNode {
    kind: NodeKind,
    from: usize,
    to: usize,
    parent: Option<usize>,
    index_in_parent: usize,
    children: Vec<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    root: Option<usize>,
}

impl SyntaxTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a node over `from..to` adopting `children`, which must not have a parent yet.
    pub(crate) fn push(&mut self, kind: NodeKind, from: usize, to: usize, children: Vec<usize>) -> usize {
        let id = self.nodes.len();
        for (i, &child) in children.iter().enumerate() {
            let node = &mut self.nodes[child];
            debug_assert!(node.parent.is_none());
            node.parent = Some(id);
            node.index_in_parent = i;
        }
        self.nodes.push(SyntaxNode {
            kind,
            from,
            to,
            parent: None,
            index_in_parent: 0,
            children,
        });
        id
    }

    pub(crate) fn set_root(&mut self, id: usize) {
        self.root = Some(id);
    }

    pub(crate) fn kind(&self, id: usize) -> NodeKind {
        self.nodes[id].kind
    }

    pub(crate) fn range(&self, id: usize) -> (usize, usize) {
        let n = &self.nodes[id];
        (n.from, n.to)
    }

    /// A cursor positioned on the root node.
    ///
    /// Only trees produced by a successful parse have a root; an empty tree yields `None`.
    pub fn cursor(&self) -> Option<TreeCursor<'_>> {
        self.root.map(|node| TreeCursor { tree: self, node })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A movable position in a [`SyntaxTree`].
///
/// Movement methods return `false` and leave the cursor in place when the
/// requested node does not exist.
#[derive(Clone, Copy, Debug)]
pub struct TreeCursor<'t> {
    tree: &'t SyntaxTree,
    node: usize,
}

impl<'t> TreeCursor<'t> {
    pub fn kind(&self) -> NodeKind {
        self.tree.nodes[self.node].kind
    }

    pub fn from(&self) -> usize {
        self.tree.nodes[self.node].from
    }

    pub fn to(&self) -> usize {
        self.tree.nodes[self.node].to
    }

    /// The source text covered by the current node.
    pub fn text<'s>(&self, src: &'s str) -> &'s str {
        src.get(self.from()..self.to()).unwrap_or("")
    }

    pub fn first_child(&mut self) -> bool {
        match self.tree.nodes[self.node].children.first() {
            Some(&child) => {
                self.node = child;
                true
            }
            None => false,
        }
    }

    pub fn last_child(&mut self) -> bool {
        match self.tree.nodes[self.node].children.last() {
            Some(&child) => {
                self.node = child;
                true
            }
            None => false,
        }
    }

    pub fn next_sibling(&mut self) -> bool {
        let node = &self.tree.nodes[self.node];
        let Some(parent) = node.parent else {
            return false;
        };
        match self.tree.nodes[parent].children.get(node.index_in_parent + 1) {
            Some(&sibling) => {
                self.node = sibling;
                true
            }
            None => false,
        }
    }

    pub fn parent(&mut self) -> bool {
        match self.tree.nodes[self.node].parent {
            Some(parent) => {
                self.node = parent;
                true
            }
            None => false,
        }
    }
}
