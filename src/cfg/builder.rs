use super::{BasicBlock, ControlFlowGraph, Edge};
use crate::analyzers::python::code_children;
use petgraph::graph::{DiGraph, NodeIndex};
use tree_sitter::Node;

/// Open end of a lowered statement sequence: the block that falls through to
/// whatever comes next, or `None` when every path already left (return,
/// raise, break, continue)
type Exit = Option<NodeIndex>;

struct LoopContext {
    header: NodeIndex,
    breaks: Vec<NodeIndex>,
}

/// Lowers a Python function body into a [`ControlFlowGraph`]
pub struct CfgBuilder<'t> {
    graph: DiGraph<BasicBlock<'t>, Edge>,
    loops: Vec<LoopContext>,
}

impl<'t> Default for CfgBuilder<'t> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'t> CfgBuilder<'t> {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            loops: Vec::new(),
        }
    }

    pub fn build(mut self, function: Node<'t>) -> ControlFlowGraph<'t> {
        let entry = self.new_block();
        if let Some(body) = function.child_by_field_name("body") {
            self.process_body(body, Some(entry));
        }
        ControlFlowGraph {
            graph: self.graph,
            entry,
        }
    }

    fn new_block(&mut self) -> NodeIndex {
        self.graph.add_node(BasicBlock::default())
    }

    fn successor_of(&mut self, from: NodeIndex, edge: Edge) -> NodeIndex {
        let block = self.new_block();
        self.graph.add_edge(from, block, edge);
        block
    }

    fn push(&mut self, block: NodeIndex, stmt: Node<'t>) {
        self.graph[block].statements.push(stmt);
    }

    /// Join the open ends into a fresh block; nothing is created when no path
    /// reaches the join
    fn join(&mut self, ends: &[NodeIndex]) -> Exit {
        if ends.is_empty() {
            return None;
        }
        let join = self.new_block();
        for &end in ends {
            self.graph.add_edge(end, join, Edge::Sequential);
        }
        Some(join)
    }

    /// Lower the statements of a `block` node. Statements after the point
    /// where every path has left are unreachable and not part of the graph.
    fn process_body(&mut self, body: Node<'t>, mut current: Exit) -> Exit {
        for stmt in code_children(&body) {
            let Some(block) = current else {
                break;
            };
            current = self.process_stmt(stmt, block);
        }
        current
    }

    fn process_stmt(&mut self, stmt: Node<'t>, block: NodeIndex) -> Exit {
        match stmt.kind() {
            "return_statement" | "raise_statement" => {
                self.push(block, stmt);
                None
            }
            "break_statement" => {
                self.push(block, stmt);
                if let Some(context) = self.loops.last_mut() {
                    context.breaks.push(block);
                }
                None
            }
            "continue_statement" => {
                self.push(block, stmt);
                if let Some(header) = self.loops.last().map(|context| context.header) {
                    self.graph.add_edge(block, header, Edge::LoopBack);
                }
                None
            }
            "if_statement" => self.process_if(stmt, block),
            "for_statement" | "while_statement" => self.process_loop(stmt, block),
            "try_statement" => self.process_try(stmt, block),
            "with_statement" => {
                self.push(block, stmt);
                match stmt.child_by_field_name("body") {
                    Some(body) => self.process_body(body, Some(block)),
                    None => Some(block),
                }
            }
            "match_statement" => self.process_match(stmt, block),
            _ => {
                self.push(block, stmt);
                Some(block)
            }
        }
    }

    fn process_if(&mut self, stmt: Node<'t>, block: NodeIndex) -> Exit {
        self.push(block, stmt);
        let mut ends = Vec::new();
        let mut condition_block = block;

        let then_block = self.successor_of(condition_block, Edge::Branch { condition: true });
        if let Some(body) = stmt.child_by_field_name("consequence") {
            ends.extend(self.process_body(body, Some(then_block)));
        } else {
            ends.push(then_block);
        }

        let mut has_else = false;
        for clause in code_children(&stmt) {
            match clause.kind() {
                "elif_clause" => {
                    let elif_block =
                        self.successor_of(condition_block, Edge::Branch { condition: false });
                    self.push(elif_block, clause);
                    condition_block = elif_block;
                    let branch = self.successor_of(elif_block, Edge::Branch { condition: true });
                    ends.extend(self.lower_clause_body(clause, "consequence", branch));
                }
                "else_clause" => {
                    has_else = true;
                    let branch =
                        self.successor_of(condition_block, Edge::Branch { condition: false });
                    ends.extend(self.lower_clause_body(clause, "body", branch));
                }
                _ => {}
            }
        }
        if !has_else {
            ends.push(condition_block);
        }
        self.join(&ends)
    }

    fn lower_clause_body(&mut self, clause: Node<'t>, field: &str, block: NodeIndex) -> Exit {
        match clause.child_by_field_name(field) {
            Some(body) => self.process_body(body, Some(block)),
            None => {
                // Clauses without a named body field keep their block last
                match code_children(&clause).into_iter().rfind(|c| c.kind() == "block") {
                    Some(body) => self.process_body(body, Some(block)),
                    None => Some(block),
                }
            }
        }
    }

    fn process_loop(&mut self, stmt: Node<'t>, block: NodeIndex) -> Exit {
        let header = self.successor_of(block, Edge::Sequential);
        self.push(header, stmt);

        self.loops.push(LoopContext {
            header,
            breaks: Vec::new(),
        });
        let body_block = self.successor_of(header, Edge::Branch { condition: true });
        let body_end = match stmt.child_by_field_name("body") {
            Some(body) => self.process_body(body, Some(body_block)),
            None => Some(body_block),
        };
        if let Some(end) = body_end {
            self.graph.add_edge(end, header, Edge::LoopBack);
        }
        let breaks = self
            .loops
            .pop()
            .map(|context| context.breaks)
            .unwrap_or_default();

        let mut ends = breaks;
        // `while True:` only leaves through break, return or raise
        if !is_infinite_loop(&stmt) {
            let else_clause = code_children(&stmt)
                .into_iter()
                .find(|c| c.kind() == "else_clause");
            match else_clause {
                Some(clause) => {
                    let else_block =
                        self.successor_of(header, Edge::Branch { condition: false });
                    ends.extend(self.lower_clause_body(clause, "body", else_block));
                }
                None => ends.push(header),
            }
        }
        self.join(&ends)
    }

    /// Handlers and the unwinding `finally` hang off the block holding the
    /// `try` statement, so a `return` in the body keeps a block with no
    /// successor.
    fn process_try(&mut self, stmt: Node<'t>, block: NodeIndex) -> Exit {
        self.push(block, stmt);
        let try_block = self.successor_of(block, Edge::Sequential);
        let try_end = match stmt.child_by_field_name("body") {
            Some(body) => self.process_body(body, Some(try_block)),
            None => Some(try_block),
        };

        let mut ends = Vec::new();
        let mut else_clause = None;
        let mut finally_clause = None;
        for clause in code_children(&stmt) {
            match clause.kind() {
                "except_clause" | "except_group_clause" => {
                    let handler = self.successor_of(block, Edge::Exception);
                    self.push(handler, clause);
                    ends.extend(self.lower_clause_body(clause, "body", handler));
                }
                "else_clause" => else_clause = Some(clause),
                "finally_clause" => finally_clause = Some(clause),
                _ => {}
            }
        }

        match (try_end, else_clause) {
            (Some(end), Some(clause)) => {
                let else_block = self.successor_of(end, Edge::Sequential);
                ends.extend(self.lower_clause_body(clause, "body", else_block));
            }
            (Some(end), None) => ends.push(end),
            (None, _) => {}
        }

        let Some(clause) = finally_clause else {
            return self.join(&ends);
        };
        if ends.is_empty() {
            // Only reached while unwinding; control does not continue past it
            let finally_block = self.successor_of(block, Edge::Exception);
            self.lower_clause_body(clause, "body", finally_block);
            return None;
        }
        let finally_block = self.join(&ends)?;
        self.lower_clause_body(clause, "body", finally_block)
    }

    fn process_match(&mut self, stmt: Node<'t>, block: NodeIndex) -> Exit {
        self.push(block, stmt);
        let mut ends = Vec::new();
        let mut exhaustive = false;
        let cases = stmt
            .child_by_field_name("body")
            .map(|body| code_children(&body))
            .unwrap_or_default();
        for case in cases.into_iter().filter(|c| c.kind() == "case_clause") {
            let case_block = self.successor_of(block, Edge::Branch { condition: true });
            self.push(case_block, case);
            ends.extend(self.lower_clause_body(case, "consequence", case_block));
            exhaustive |= is_irrefutable_case(&case);
        }
        if !exhaustive {
            ends.push(block);
        }
        self.join(&ends)
    }
}

fn is_infinite_loop(stmt: &Node) -> bool {
    stmt.kind() == "while_statement"
        && stmt
            .child_by_field_name("condition")
            .is_some_and(|condition| condition.kind() == "true")
}

/// `case _:` without a guard matches everything
fn is_irrefutable_case(case: &Node) -> bool {
    let children = code_children(case);
    let has_guard = children.iter().any(|c| c.kind() == "if_clause" || c.kind() == "guard");
    let wildcard = children.first().is_some_and(|pattern| {
        pattern.kind() == "case_pattern" && pattern.named_child_count() == 0
    });
    wildcard && !has_guard
}

#[cfg(test)]
mod tests {
    use crate::analyzers::python::ParsedSource;
    use crate::cfg::ControlFlowGraph;
    use indoc::indoc;

    fn terminal_returns(source: &str) -> (usize, Vec<String>) {
        let parsed = ParsedSource::parse(source).unwrap();
        let function = parsed.function().unwrap();
        let cfg = ControlFlowGraph::from_function(function);
        let terminals = cfg.terminal_blocks();
        let returns = terminals
            .iter()
            .filter_map(|&index| cfg.block(index).return_statement())
            .map(|stmt| parsed.text(&stmt).to_string())
            .collect();
        (terminals.len(), returns)
    }

    #[test]
    fn test_straight_line_function() {
        let (terminals, returns) = terminal_returns("def f(x):\n    y = x\n    return y\n");
        assert_eq!(terminals, 1);
        assert_eq!(returns, vec!["return y"]);
    }

    #[test]
    fn test_if_without_else_falls_through() {
        let source = indoc! {"
            def f(x):
                if x:
                    return 1
                x += 1
        "};
        let (terminals, returns) = terminal_returns(source);
        assert_eq!(terminals, 2);
        assert_eq!(returns, vec!["return 1"]);
    }

    #[test]
    fn test_if_elif_else_all_return_creates_no_join() {
        let source = indoc! {"
            def sign(x):
                if x > 0:
                    return 1
                elif x < 0:
                    return -1
                else:
                    return 0
        "};
        let (terminals, returns) = terminal_returns(source);
        assert_eq!(terminals, 3);
        assert_eq!(returns.len(), 3);
    }

    #[test]
    fn test_loop_with_break_and_else() {
        let source = indoc! {"
            def find(xs, target):
                for x in xs:
                    if x == target:
                        break
                else:
                    return None
                return x
        "};
        let (_, returns) = terminal_returns(source);
        assert_eq!(returns, vec!["return None", "return x"]);
    }

    #[test]
    fn test_infinite_loop_exits_only_through_return() {
        let source = indoc! {"
            def spin(queue):
                while True:
                    item = queue.pop()
                    if item:
                        return item
        "};
        let (terminals, returns) = terminal_returns(source);
        assert_eq!(terminals, 1);
        assert_eq!(returns, vec!["return item"]);
    }

    #[test]
    fn test_raise_is_terminal_without_return() {
        let source = indoc! {"
            def check(x):
                if x < 0:
                    raise ValueError(x)
                return x * 2
        "};
        let (terminals, returns) = terminal_returns(source);
        assert_eq!(terminals, 2);
        assert_eq!(returns, vec!["return x * 2"]);
    }

    #[test]
    fn test_try_except_finally() {
        let source = indoc! {"
            def load(path):
                try:
                    data = read(path)
                except OSError:
                    return None
                finally:
                    cleanup()
                return data
        "};
        let (_, returns) = terminal_returns(source);
        assert_eq!(returns, vec!["return None", "return data"]);
    }

    #[test]
    fn test_return_inside_try_body_is_terminal() {
        let source = indoc! {"
            def f(x):
                try:
                    return compute(x)
                except ValueError:
                    return None
        "};
        let parsed = ParsedSource::parse(source).unwrap();
        let cfg = ControlFlowGraph::from_function(parsed.function().unwrap());
        // entry, try body, handler
        assert_eq!(cfg.block_count(), 3);
        assert_eq!(cfg.successors(cfg.entry).len(), 2);

        let (terminals, returns) = terminal_returns(source);
        assert_eq!(terminals, 2);
        assert_eq!(returns, vec!["return compute(x)", "return None"]);
    }

    #[test]
    fn test_return_inside_try_with_finally() {
        let source = indoc! {"
            def g(x):
                try:
                    return x + 1
                finally:
                    cleanup()
        "};
        let (terminals, returns) = terminal_returns(source);
        assert_eq!(terminals, 2);
        assert_eq!(returns, vec!["return x + 1"]);
    }

    #[test]
    fn test_return_inside_try_in_loop() {
        let source = indoc! {"
            def first_parsed(xs):
                for x in xs:
                    try:
                        return parse(x)
                    except ValueError:
                        continue
        "};
        let (_, returns) = terminal_returns(source);
        assert_eq!(returns, vec!["return parse(x)"]);
    }

    #[test]
    fn test_unreachable_code_is_dropped() {
        let source = indoc! {"
            def f():
                return 1
                return compute()
        "};
        let (terminals, returns) = terminal_returns(source);
        assert_eq!(terminals, 1);
        assert_eq!(returns, vec!["return 1"]);
    }

    #[test]
    fn test_match_with_wildcard() {
        let source = indoc! {"
            def describe(value):
                match value:
                    case 0:
                        return 'zero'
                    case _:
                        return str(value)
        "};
        let (terminals, returns) = terminal_returns(source);
        assert_eq!(terminals, 2);
        assert_eq!(returns, vec!["return 'zero'", "return str(value)"]);
    }
}
