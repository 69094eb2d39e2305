use std::sync::Arc;

use crate::error::{ErrorCode, SyntaxError};
use crate::runtime::value::Value;
use crate::syntax::ast::{Arity, BinaryOp, Expr, Operation, Script};
use crate::syntax::reader::Reader;

/// Names that start a global lookup when they open an identifier.
pub const GLOBAL_NAMES: &[&str] = &[
    "this", "temp", "math", "query", "variable", "c", "q", "t", "v",
    "geometry", "material", "texture", "array", "context",
];

/// Two-phase parser: tokens are collected flat per expression, then folded
/// together by descending operator priority.
pub struct Parser<'a> {
    reader: Reader<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { reader: Reader::new(source) }
    }

    pub fn parse(mut self) -> Result<Script, SyntaxError> {
        let exprs = self.parse_block_exprs()?;
        Ok(Script::new(exprs, self.reader.source()))
    }

    // ─── Blocks ──────────────────────────────────────────────────────────────

    /// Reads expressions until `}` `)` `]` or end of input, consuming the terminator.
    fn parse_block_exprs(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut exprs = Vec::new();
        loop {
            self.reader.skip_whitespace();
            let c = self.reader.read();
            if matches!(c, '\0' | '}' | ')' | ']') { break; }
            if c == ';' { continue; }
            self.reader.back();

            let before = self.reader.position();
            exprs.push(self.parse_expression()?);
            if self.reader.position() == before {
                return Err(self.unexpected(before));
            }
        }
        Ok(exprs)
    }

    fn parse_nested_block(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.reader.position();
        self.reader.read(); // {
        let exprs = self.parse_block_exprs()?;
        let source = self.reader.slice(start, self.reader.position());
        Ok(Expr::Block(Arc::new(Script::new(exprs, source))))
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.reader.position();
        let mut tokens: Vec<Expr> = Vec::new();
        loop {
            self.reader.skip_whitespace();
            if matches!(self.reader.peek(), '\0' | ';' | '}' | ')' | ']' | ':' | ',') {
                break;
            }
            let token = self.parse_token(tokens.last())?;
            tokens.push(token);
        }
        self.resolve_priorities(tokens, start)
    }

    /// Folds operation tokens into their operands, highest priority first.
    fn resolve_priorities(&self, mut tokens: Vec<Expr>, start: usize) -> Result<Expr, SyntaxError> {
        let max_priority = tokens
            .iter()
            .filter_map(Expr::as_operation)
            .map(Operation::priority)
            .max();

        if let Some(max_priority) = max_priority {
            for level in (0..=max_priority).rev() {
                let mut reduced: Vec<Expr> = Vec::with_capacity(tokens.len());
                let mut raw = tokens.into_iter();

                while let Some(mut token) = raw.next() {
                    let Some(op) = token.as_operation_mut() else {
                        reduced.push(token);
                        continue;
                    };
                    if op.priority() != level {
                        reduced.push(token);
                        continue;
                    }

                    match op.arity() {
                        Arity::Complete => {}
                        Arity::Left => {
                            if let Some(slot) = op.left_slot() {
                                if slot.is_none() {
                                    let left = reduced.pop().ok_or_else(|| self.missing_operand(start))?;
                                    *slot = Some(left);
                                }
                            }
                        }
                        Arity::Right => {
                            if let Some(slot) = op.right_slot() {
                                if slot.is_none() {
                                    let right = raw.next().ok_or_else(|| self.missing_operand(start))?;
                                    *slot = Some(right);
                                }
                            }
                        }
                        Arity::LeftRight => {
                            if let Some(slot) = op.left_slot() {
                                if slot.is_none() {
                                    if reduced.is_empty() {
                                        *slot = Some(Expr::constant(Value::Number(0.0)));
                                    } else {
                                        // An open binary on the left means this one is unary.
                                        let unary = reduced
                                            .last()
                                            .and_then(Expr::as_operation)
                                            .is_some_and(Operation::is_open_binary);
                                        if !unary {
                                            *slot = reduced.pop();
                                        }
                                    }
                                }
                            }
                            if let Some(slot) = op.right_slot() {
                                if slot.is_none() {
                                    let mut right = raw.next().ok_or_else(|| self.missing_operand(start))?;
                                    if let Some(inner) = right.as_operation_mut() {
                                        if inner.is_open_binary() {
                                            let operand = raw.next().ok_or_else(|| self.missing_operand(start))?;
                                            if let Some(inner_slot) = inner.right_slot() {
                                                *inner_slot = Some(operand);
                                            }
                                        }
                                    }
                                    *slot = Some(right);
                                }
                            }
                        }
                    }
                    reduced.push(token);
                }
                tokens = reduced;
            }
        }

        match tokens.len() {
            0 => Ok(Expr::constant(Value::Null)),
            1 => Ok(tokens.remove(0)),
            _ => {
                let (line, column) = self.reader.line_column(start);
                let text = self.reader.slice(start, self.reader.position());
                Err(SyntaxError::new(ErrorCode::P002, line, column,
                    format!("invalid expression `{}`", text.trim())))
            }
        }
    }

    // ─── Tokens ──────────────────────────────────────────────────────────────

    fn parse_token(&mut self, prev: Option<&Expr>) -> Result<Expr, SyntaxError> {
        let c = self.reader.peek();

        if c.is_ascii_digit() { return self.parse_number(); }
        if c == '\'' { return Ok(self.parse_string()); }
        if self.is_word("true") {
            self.reader.advance_by(4);
            return Ok(Expr::constant(Value::Boolean(true)));
        }
        if self.is_word("false") {
            self.reader.advance_by(5);
            return Ok(Expr::constant(Value::Boolean(false)));
        }
        if c == '(' {
            let is_call = match prev {
                Some(Expr::Operation(op)) => op.is_callable_position(),
                Some(Expr::Parenthesized(_)) => true,
                _ => false,
            };
            return if is_call { self.parse_call() } else { self.parse_parentheses() };
        }
        if c == '{' { return self.parse_nested_block(); }
        if self.is_statement_keyword("return") { return self.parse_return(); }
        if self.is_statement_keyword("break") {
            self.reader.advance_by(5);
            return Ok(Expr::op(Operation::Break));
        }
        if self.is_statement_keyword("continue") {
            self.reader.advance_by(8);
            return Ok(Expr::op(Operation::Continue));
        }
        if self.is_keyword_call("loop") { return self.parse_loop(); }
        if self.is_keyword_call("for_each") { return self.parse_for_each(); }
        if c == '.' { return Ok(self.parse_field()); }
        if c == '[' { return self.parse_index(); }

        if self.reader.is("??") { return Ok(self.binary(2, BinaryOp::Coalesce)); }
        if c == '?' { return self.parse_conditional(); }
        if self.reader.is("!=") { return Ok(self.binary(2, BinaryOp::NotEq)); }
        if c == '!' {
            self.reader.read();
            return Ok(Expr::op(Operation::Not(None)));
        }
        if self.reader.is("||") { return Ok(self.binary(2, BinaryOp::Or)); }
        if self.reader.is("&&") { return Ok(self.binary(2, BinaryOp::And)); }
        if self.reader.is("<=") { return Ok(self.binary(2, BinaryOp::LtEq)); }
        if self.reader.is(">=") { return Ok(self.binary(2, BinaryOp::GtEq)); }
        if self.reader.is("==") { return Ok(self.binary(2, BinaryOp::Eq)); }
        match c {
            '<' => return Ok(self.binary(1, BinaryOp::Lt)),
            '>' => return Ok(self.binary(1, BinaryOp::Gt)),
            '+' => return Ok(self.binary(1, BinaryOp::Add)),
            '-' => return Ok(self.binary(1, BinaryOp::Sub)),
            '*' => return Ok(self.binary(1, BinaryOp::Mul)),
            '/' => return Ok(self.binary(1, BinaryOp::Div)),
            '=' => return Ok(self.binary(1, BinaryOp::Assign)),
            _ => {}
        }

        if c.is_alphabetic() {
            let is_global = GLOBAL_NAMES.iter().any(|name| {
                self.reader.is(name) && !self.reader.peek_at(name.len()).is_alphabetic()
            });
            return Ok(if is_global { self.parse_global() } else { self.parse_bare_string() });
        }

        let pos = self.reader.position();
        let (line, column) = self.reader.line_column(pos);
        Err(SyntaxError::new(ErrorCode::P001, line, column,
            format!("unknown character `{c}`")))
    }

    fn binary(&mut self, width: usize, op: BinaryOp) -> Expr {
        self.reader.advance_by(width);
        Expr::op(Operation::binary(op))
    }

    fn parse_number(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.reader.position();
        let mut prev = '\0';
        loop {
            let c = self.reader.peek();
            let sign_after_exponent = (c == '+' || c == '-') && prev == 'e';
            if c == '\0' || !(c.is_ascii_digit() || c == '.' || c == 'e' || c == 'f' || sign_after_exponent) {
                break;
            }
            self.reader.read();
            prev = c;
        }
        let text = self.reader.slice(start, self.reader.position());
        let digits = text.strip_suffix('f').unwrap_or(&text);
        match digits.parse::<f32>() {
            Ok(n) => Ok(Expr::constant(Value::Number(n))),
            Err(_) => {
                let (line, column) = self.reader.line_column(start);
                Err(SyntaxError::new(ErrorCode::P003, line, column,
                    format!("malformed number literal `{text}`")))
            }
        }
    }

    fn parse_string(&mut self) -> Expr {
        self.reader.read(); // opening '
        let start = self.reader.position();
        let mut end;
        loop {
            end = self.reader.position();
            match self.reader.read() {
                '\0' | '\'' => break,
                _ => {}
            }
        }
        Expr::constant(Value::String(self.reader.slice(start, end)))
    }

    /// Unquoted text that is not a global: runs to the next `; ) } , .`.
    fn parse_bare_string(&mut self) -> Expr {
        let start = self.reader.position();
        while !matches!(self.reader.peek(), '\0' | ';' | ')' | '}' | ',' | '.') {
            self.reader.read();
        }
        Expr::constant(Value::String(self.reader.slice(start, self.reader.position())))
    }

    fn parse_parentheses(&mut self) -> Result<Expr, SyntaxError> {
        self.reader.read(); // (
        let inner = self.parse_expression()?;
        self.expect_char(')')?;
        Ok(Expr::Parenthesized(Box::new(inner)))
    }

    fn parse_return(&mut self) -> Result<Expr, SyntaxError> {
        self.reader.advance_by(6);
        self.reader.skip_whitespace();
        let value = if matches!(self.reader.peek(), '\0' | ';' | ')' | '}') {
            Expr::constant(Value::Null)
        } else {
            self.parse_expression()?
        };
        Ok(Expr::op(Operation::Return(value)))
    }

    fn parse_loop(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.reader.position();
        self.reader.advance_by(4);
        let mut args = self.parse_loop_arguments()?.into_iter();
        match (args.next(), args.next()) {
            (Some(count), Some(body)) => Ok(Expr::op(Operation::Loop { count, body })),
            _ => Err(self.malformed_loop("loop", start)),
        }
    }

    fn parse_for_each(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.reader.position();
        self.reader.advance_by(8);
        let mut args = self.parse_loop_arguments()?.into_iter();
        match (args.next(), args.next(), args.next()) {
            (Some(slot), Some(array), Some(body)) => Ok(Expr::op(Operation::ForEach { slot, array, body })),
            _ => Err(self.malformed_loop("for_each", start)),
        }
    }

    /// `( a ; b , c )`: both separators are accepted.
    fn parse_loop_arguments(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        self.reader.skip_whitespace();
        self.reader.read(); // (
        let mut args = Vec::new();
        loop {
            self.reader.skip_whitespace();
            let c = self.reader.read();
            if matches!(c, '\0' | ')') { break; }
            if matches!(c, ';' | ',') { continue; }
            self.reader.back();

            let before = self.reader.position();
            args.push(self.parse_expression()?);
            if self.reader.position() == before {
                return Err(self.unexpected(before));
            }
        }
        Ok(args)
    }

    fn parse_call(&mut self) -> Result<Expr, SyntaxError> {
        self.reader.read(); // (
        let mut args = Vec::new();
        loop {
            self.reader.skip_whitespace();
            let c = self.reader.read();
            if matches!(c, '\0' | ')') { break; }
            self.reader.back();

            let before = self.reader.position();
            args.push(self.parse_expression()?);
            if self.reader.peek() == ',' {
                self.reader.read();
            } else if self.reader.position() == before {
                return Err(self.unexpected(before));
            }
        }
        Ok(Expr::op(Operation::Call { callee: None, args }))
    }

    fn parse_field(&mut self) -> Expr {
        self.reader.read(); // .
        let name = self.read_identifier();
        Expr::op(Operation::Field { target: None, name })
    }

    fn parse_index(&mut self) -> Result<Expr, SyntaxError> {
        self.reader.read(); // [
        let index = self.parse_expression()?;
        self.expect_char(']')?;
        Ok(Expr::op(Operation::Index { target: None, index }))
    }

    fn parse_conditional(&mut self) -> Result<Expr, SyntaxError> {
        self.reader.read(); // ?
        let then = self.parse_expression()?;
        self.reader.skip_whitespace();
        let otherwise = if self.reader.peek() == ':' {
            self.reader.read();
            self.parse_expression()?
        } else {
            Expr::constant(Value::Null)
        };
        Ok(Expr::op(Operation::Conditional { cond: None, then, otherwise }))
    }

    fn parse_global(&mut self) -> Expr {
        let name = self.read_identifier();
        Expr::op(Operation::Global(name))
    }

    // ─── Helpers ─────────────────────────────────────────────────────────────

    /// Reads `[A-Za-z0-9_]*` and lower-cases it.
    fn read_identifier(&mut self) -> String {
        let start = self.reader.position();
        while is_identifier_char(self.reader.peek()) {
            self.reader.read();
        }
        self.reader.slice(start, self.reader.position()).to_lowercase()
    }

    fn is_word(&self, word: &str) -> bool {
        if !self.reader.is(word) { return false; }
        !is_identifier_char(self.reader.peek_at(word.len()))
    }

    /// `return`, `break`, `continue` count only before whitespace, `;`, `)`, `}` or end.
    fn is_statement_keyword(&self, word: &str) -> bool {
        if !self.reader.is(word) { return false; }
        let next = self.reader.peek_at(word.len());
        next == '\0' || next.is_whitespace() || matches!(next, ';' | ')' | '}')
    }

    /// `loop` / `for_each` followed, after optional whitespace, by `(`.
    fn is_keyword_call(&self, word: &str) -> bool {
        if !self.reader.is(word) { return false; }
        let mut offset = word.len();
        while self.reader.peek_at(offset).is_whitespace() {
            offset += 1;
        }
        self.reader.peek_at(offset) == '('
    }

    fn expect_char(&mut self, expected: char) -> Result<(), SyntaxError> {
        self.reader.skip_whitespace();
        if self.reader.peek() == expected {
            self.reader.read();
            return Ok(());
        }
        let pos = self.reader.position();
        let (line, column) = self.reader.line_column(pos);
        let found = match self.reader.peek() {
            '\0' => "end of input".to_string(),
            other => format!("`{other}`"),
        };
        Err(SyntaxError::new(ErrorCode::P002, line, column,
            format!("expected `{expected}`, found {found}")))
    }

    fn missing_operand(&self, start: usize) -> SyntaxError {
        let (line, column) = self.reader.line_column(start);
        let text = self.reader.slice(start, self.reader.position());
        SyntaxError::new(ErrorCode::P002, line, column,
            format!("operator is missing an operand in `{}`", text.trim()))
    }

    fn unexpected(&self, pos: usize) -> SyntaxError {
        let (line, column) = self.reader.line_column(pos);
        SyntaxError::new(ErrorCode::P002, line, column,
            format!("unexpected `{}`", self.reader.peek()))
    }

    fn malformed_loop(&self, keyword: &str, start: usize) -> SyntaxError {
        let (line, column) = self.reader.line_column(start);
        SyntaxError::new(ErrorCode::P004, line, column,
            format!("invalid {keyword} at {line}:{column}"))
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> Script {
        Parser::new(src).parse().unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    fn parse_err(src: &str) -> SyntaxError {
        Parser::new(src).parse().expect_err("expected parse error")
    }

    /// Renders the first expression as an s-expression.
    fn sexpr(src: &str) -> String {
        let script = parse(src);
        assert_eq!(script.exprs.len(), 1, "expected one expression in {src:?}");
        show(&script.exprs[0])
    }

    fn show_slot(slot: &Option<Expr>) -> String {
        slot.as_ref().map(show).unwrap_or_else(|| "_".into())
    }

    fn show(expr: &Expr) -> String {
        match expr {
            Expr::Constant(Value::Number(n)) => format!("{n}"),
            Expr::Constant(Value::String(s)) => format!("'{s}'"),
            Expr::Constant(Value::Boolean(b)) => format!("{b}"),
            Expr::Constant(Value::Null) => "null".into(),
            Expr::Constant(other) => format!("{other:?}"),
            Expr::Parenthesized(inner) => format!("({})", show(inner)),
            Expr::Block(script) => {
                let inner: Vec<String> = script.exprs.iter().map(show).collect();
                format!("{{{}}}", inner.join("; "))
            }
            Expr::Operation(op) => match op.as_ref() {
                Operation::Global(name) => name.clone(),
                Operation::Break => "break".into(),
                Operation::Continue => "continue".into(),
                Operation::Return(e) => format!("(return {})", show(e)),
                Operation::Loop { count, body } => format!("(loop {} {})", show(count), show(body)),
                Operation::ForEach { slot, array, body } =>
                    format!("(for_each {} {} {})", show(slot), show(array), show(body)),
                Operation::Field { target, name } => format!("{}.{name}", show_slot(target)),
                Operation::Index { target, index } => format!("{}[{}]", show_slot(target), show(index)),
                Operation::Call { callee, args } => {
                    let args: Vec<String> = args.iter().map(show).collect();
                    format!("{}({})", show_slot(callee), args.join(", "))
                }
                Operation::Conditional { cond, then, otherwise } =>
                    format!("({} ? {} : {})", show_slot(cond), show(then), show(otherwise)),
                Operation::Not(operand) => format!("(! {})", show_slot(operand)),
                Operation::Binary { op, left, right } =>
                    format!("({} {} {})", op.symbol(), show_slot(left), show_slot(right)),
            },
        }
    }

    // ── literals ─────────────────────────────────────────────────────────────

    #[test]
    fn number_literals() {
        assert_eq!(sexpr("42"), "42");
        assert_eq!(sexpr("3.5"), "3.5");
        assert_eq!(sexpr("2.5f"), "2.5");
        assert_eq!(sexpr("1e3"), "1000");
        assert_eq!(sexpr("1.5e-1"), "0.15");
    }

    #[test]
    fn string_and_boolean_literals() {
        assert_eq!(sexpr("'hello world'"), "'hello world'");
        assert_eq!(sexpr("TRUE"), "true");
        assert_eq!(sexpr("false"), "false");
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        assert_eq!(sexpr("'abc"), "'abc'");
    }

    #[test]
    fn bare_word_is_string() {
        assert_eq!(sexpr("minecraft:stone"), "'minecraft:stone'");
        assert_eq!(sexpr("hello"), "'hello'");
    }

    #[test]
    fn empty_source_has_no_expressions() {
        assert!(parse("").exprs.is_empty());
        assert!(parse(" ;; ").exprs.is_empty());
    }

    // ── precedence ───────────────────────────────────────────────────────────

    #[test]
    fn multiplication_binds_tighter() {
        assert_eq!(sexpr("5 + 3 * 2"), "(+ 5 (* 3 2))");
        assert_eq!(sexpr("5 * 3 + 2"), "(+ (* 5 3) 2)");
    }

    #[test]
    fn same_priority_folds_left_to_right() {
        assert_eq!(sexpr("10 - 4 - 3"), "(- (- 10 4) 3)");
    }

    #[test]
    fn leading_minus_gets_zero_left() {
        assert_eq!(sexpr("-5"), "(- 0 5)");
    }

    #[test]
    fn minus_after_operator_is_unary() {
        assert_eq!(sexpr("3 * -2"), "(* 3 (- _ 2))");
        assert_eq!(sexpr("1 == -1"), "(== 1 (- _ 1))");
    }

    #[test]
    fn logic_and_comparison_levels() {
        assert_eq!(sexpr("v.a < 1 && v.b || v.c"), "(|| (&& (< v.a 1) v.b) v.c)");
        assert_eq!(sexpr("!v.x == 1"), "(== (! v.x) 1)");
    }

    #[test]
    fn assignment_is_lowest() {
        assert_eq!(sexpr("v.x = 1 + 2"), "(= v.x (+ 1 2))");
        assert_eq!(sexpr("t.a = v.b ?? 3"), "(= t.a (?? v.b 3))");
    }

    #[test]
    fn conditional_takes_preceding_condition() {
        assert_eq!(sexpr("v.a > 1 ? 2 : 3"), "((> v.a 1) ? 2 : 3)");
        assert_eq!(sexpr("q.x ? 1"), "(q.x ? 1 : null)");
    }

    // ── access and calls ─────────────────────────────────────────────────────

    #[test]
    fn globals_are_lower_cased() {
        assert_eq!(sexpr("Variable.Foo"), "variable.foo");
        assert_eq!(sexpr("q.is_baby"), "q.is_baby");
        assert_eq!(sexpr("context.owner"), "context.owner");
    }

    #[test]
    fn call_after_field_access() {
        assert_eq!(sexpr("math.clamp(v.x, 0, 1)"), "math.clamp(v.x, 0, 1)");
        assert_eq!(sexpr("math.pi()"), "math.pi()");
        assert_eq!(sexpr("math.pi( )"), "math.pi()");
    }

    #[test]
    fn parenthesis_after_number_groups() {
        assert_eq!(sexpr("2 * (1 + 1)"), "(* 2 ((+ 1 1)))");
    }

    #[test]
    fn parenthesis_after_parenthesis_calls() {
        assert_eq!(sexpr("(v.f)(1)"), "(v.f)(1)");
    }

    #[test]
    fn index_access() {
        assert_eq!(sexpr("v.list[1 + 1]"), "v.list[(+ 1 1)]");
        assert_eq!(sexpr("v.grid[0][2]"), "v.grid[0][2]");
    }

    // ── statements ───────────────────────────────────────────────────────────

    #[test]
    fn semicolons_separate_expressions() {
        let script = parse("v.a = 1; v.b = 2;");
        assert_eq!(script.exprs.len(), 2);
    }

    #[test]
    fn nested_block_keeps_its_own_source() {
        let script = parse("{ t.a = 1; return t.a; }");
        match &script.exprs[0] {
            Expr::Block(inner) => {
                assert_eq!(inner.exprs.len(), 2);
                assert_eq!(&*inner.source, "{ t.a = 1; return t.a; }");
            }
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn return_without_value() {
        assert_eq!(sexpr("return"), "(return null)");
        assert_eq!(sexpr("return;"), "(return null)");
        assert_eq!(sexpr("return 1 + 1"), "(return (+ 1 1))");
    }

    #[test]
    fn return_inside_block_leaves_brace() {
        assert_eq!(sexpr("{ return 1 }"), "{(return 1)}");
    }

    #[test]
    fn keywords_need_terminators() {
        assert_eq!(sexpr("{ break; continue }"), "{break; continue}");
        assert_eq!(sexpr("breakfast"), "'breakfast'");
    }

    #[test]
    fn loop_and_for_each() {
        assert_eq!(sexpr("loop(3, { v.i = v.i + 1; })"), "(loop 3 {(= v.i (+ v.i 1))})");
        assert_eq!(sexpr("loop (2; v.x)"), "(loop 2 v.x)");
        assert_eq!(
            sexpr("for_each(t.e, v.list, { v.sum = v.sum + t.e; })"),
            "(for_each t.e v.list {(= v.sum (+ v.sum t.e))})",
        );
    }

    // ── errors ───────────────────────────────────────────────────────────────

    #[test]
    fn unknown_character() {
        let e = parse_err("v.x = 1 # 2");
        assert_eq!(e.code, ErrorCode::P001);
        assert_eq!((e.line, e.column), (1, 9));
    }

    #[test]
    fn missing_operand() {
        assert_eq!(parse_err("1 +").code, ErrorCode::P002);
        assert_eq!(parse_err(".x").code, ErrorCode::P002);
    }

    #[test]
    fn leftover_tokens() {
        assert_eq!(parse_err("1 2").code, ErrorCode::P002);
    }

    #[test]
    fn malformed_number() {
        assert_eq!(parse_err("1.2.3").code, ErrorCode::P003);
    }

    #[test]
    fn loop_needs_body() {
        assert_eq!(parse_err("loop(3)").code, ErrorCode::P004);
        assert_eq!(parse_err("for_each(t.x, v.list)").code, ErrorCode::P004);
    }

    #[test]
    fn stray_separator_does_not_hang() {
        assert_eq!(parse_err("1, 2").code, ErrorCode::P002);
        assert_eq!(parse_err("math.abs(1 : 2)").code, ErrorCode::P002);
    }

    #[test]
    fn error_reports_line() {
        let e = parse_err("v.a = 1;\nv.b = @;");
        assert_eq!(e.line, 2);
    }
}
