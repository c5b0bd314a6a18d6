//! Expression and data-type parsing with explicit ClickHouse precedence.
//!
//! Precedence, low to high: `OR` < `AND` < `NOT` < comparison (`=`, `<>`,
//! `LIKE`, `IN`, `BETWEEN`, `IS [NOT] NULL`) < additive (`+ -`) <
//! multiplicative (`* / %`) < unary < postfix/primary.

use super::{Parser, token::TokKind};
use crate::ast::{
    BinaryOperator, DataType, Expr, FunctionCall, Literal, TypeArg, UnaryOperator, WindowSpec
};
use crate::error::Result;

impl Parser {
    pub(super) fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("OR") {
            let right = self.parse_and()?;
            left = Expr::BinaryOp { left: Box::new(left), op: BinaryOperator::Or, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.eat_keyword("AND") {
            let right = self.parse_not()?;
            left = Expr::BinaryOp { left: Box::new(left), op: BinaryOperator::And, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.eat_keyword("NOT") {
            let expr = self.parse_not()?;
            Ok(Expr::UnaryOp { op: UnaryOperator::Not, expr: Box::new(expr) })
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            if self.eat_keyword("IS") {
                let negated = self.eat_keyword("NOT");
                self.expect_keyword("NULL")?;
                left = Expr::IsNull { expr: Box::new(left), negated };
                continue;
            }
            if self.is_keyword("NOT") && (self.is_keyword_n(1, "IN") || self.is_keyword_n(1, "BETWEEN") || self.is_keyword_n(1, "LIKE")) {
                self.advance();
                left = self.parse_comparison_tail(left, true)?;
                continue;
            }
            if self.is_keyword("IN") || self.is_keyword("BETWEEN") || self.is_keyword("LIKE") {
                left = self.parse_comparison_tail(left, false)?;
                continue;
            }
            let op = match &self.peek().kind {
                TokKind::Eq => BinaryOperator::Eq,
                TokKind::NotEq => BinaryOperator::NotEq,
                TokKind::Lt => BinaryOperator::Lt,
                TokKind::LtEq => BinaryOperator::LtEq,
                TokKind::Gt => BinaryOperator::Gt,
                TokKind::GtEq => BinaryOperator::GtEq,
                _ => break
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_comparison_tail(&mut self, left: Expr, negated: bool) -> Result<Expr> {
        if self.eat_keyword("IN") {
            let list = self.parse_paren_list(|p| p.parse_expr())?;
            return Ok(Expr::InList { expr: Box::new(left), list, negated });
        }
        if self.eat_keyword("BETWEEN") {
            let low = self.parse_additive()?;
            self.expect_keyword("AND")?;
            let high = self.parse_additive()?;
            return Ok(Expr::Between { expr: Box::new(left), negated, low: Box::new(low), high: Box::new(high) });
        }
        if self.eat_keyword("LIKE") {
            let right = self.parse_additive()?;
            let op = if negated { BinaryOperator::NotLike } else { BinaryOperator::Like };
            return Ok(Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) });
        }
        Err(self.unexpected("IN, BETWEEN, or LIKE"))
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.peek().kind {
                TokKind::Plus => BinaryOperator::Plus,
                TokKind::Minus => BinaryOperator::Minus,
                TokKind::Pipe if self.peek_n(1).kind == TokKind::Pipe => {
                    self.advance();
                    self.advance();
                    let right = self.parse_multiplicative()?;
                    left = Expr::BinaryOp { left: Box::new(left), op: BinaryOperator::Concat, right: Box::new(right) };
                    continue;
                }
                _ => break
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.peek().kind {
                TokKind::Star => BinaryOperator::Multiply,
                TokKind::Slash => BinaryOperator::Divide,
                TokKind::Percent => BinaryOperator::Modulo,
                _ => break
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat_punct(TokKind::Minus) {
            let expr = self.parse_unary()?;
            return Ok(Expr::UnaryOp { op: UnaryOperator::Minus, expr: Box::new(expr) });
        }
        if self.eat_punct(TokKind::Plus) {
            let expr = self.parse_unary()?;
            return Ok(Expr::UnaryOp { op: UnaryOperator::Plus, expr: Box::new(expr) });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        while self.eat_keyword("OVER") {
            let spec = self.parse_window_spec()?;
            expr = Expr::Window { function: Box::new(expr), spec };
        }
        Ok(expr)
    }

    fn parse_window_spec(&mut self) -> Result<WindowSpec> {
        self.expect_punct(TokKind::LParen)?;
        let mut spec = WindowSpec::default();
        if self.eat_keywords(&["PARTITION", "BY"]) {
            loop {
                spec.partition_by.push(self.parse_expr()?);
                if !self.eat_punct(TokKind::Comma) {
                    break;
                }
            }
        }
        if self.eat_keywords(&["ORDER", "BY"]) {
            spec.order_by = self.parse_order_by_items()?;
        }
        self.expect_punct(TokKind::RParen)?;
        Ok(spec)
    }

    pub(super) fn parse_order_by_items(&mut self) -> Result<Vec<crate::ast::OrderByItem>> {
        let mut items = Vec::new();
        loop {
            let expr = self.parse_expr()?;
            let desc = if self.eat_keyword("DESC") {
                true
            } else {
                self.eat_keyword("ASC");
                false
            };
            items.push(crate::ast::OrderByItem { expr, desc });
            if !self.eat_punct(TokKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        if self.eat_punct(TokKind::Star) {
            return Ok(Expr::Wildcard);
        }
        if self.is_keyword("NULL") {
            self.advance();
            return Ok(Expr::Literal(Literal::Null));
        }
        if self.is_keyword("TRUE") {
            self.advance();
            return Ok(Expr::Literal(Literal::Bool(true)));
        }
        if self.is_keyword("FALSE") {
            self.advance();
            return Ok(Expr::Literal(Literal::Bool(false)));
        }
        if self.is_keyword("CAST") {
            return self.parse_cast();
        }
        if self.is_keyword("INTERVAL") {
            return self.parse_interval();
        }
        if self.is_keyword("CASE") {
            return self.parse_case();
        }
        if self.is_keyword("SELECT") {
            let select = self.parse_select()?;
            return Ok(Expr::Subquery(Box::new(select)));
        }
        match &self.peek().kind {
            TokKind::Number(n) => {
                let n = n.clone();
                self.advance();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            TokKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::Literal(Literal::String(s)))
            }
            TokKind::LParen => self.parse_paren_expr(),
            TokKind::LBracket => {
                let items = self.parse_bracket_list(TokKind::LBracket, TokKind::RBracket)?;
                Ok(Expr::Array(items))
            }
            TokKind::LBrace => self.parse_map_literal(),
            TokKind::Ident(_) => self.parse_ident_or_call(),
            _ => Err(self.unexpected("an expression"))
        }
    }

    fn parse_paren_expr(&mut self) -> Result<Expr> {
        self.expect_punct(TokKind::LParen)?;
        if self.is_keyword("SELECT") {
            let select = self.parse_select()?;
            self.expect_punct(TokKind::RParen)?;
            return Ok(Expr::Subquery(Box::new(select)));
        }
        let mut items = vec![self.parse_expr()?];
        let mut is_tuple = false;
        while self.eat_punct(TokKind::Comma) {
            is_tuple = true;
            items.push(self.parse_expr()?);
        }
        self.expect_punct(TokKind::RParen)?;
        if is_tuple {
            Ok(Expr::Tuple(items))
        } else {
            Ok(Expr::Nested(Box::new(items.remove(0))))
        }
    }

    fn parse_bracket_list(&mut self, open: TokKind, close: TokKind) -> Result<Vec<Expr>> {
        self.expect_punct(open)?;
        let mut items = Vec::new();
        if self.peek().kind != close {
            loop {
                items.push(self.parse_expr()?);
                if !self.eat_punct(TokKind::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(close)?;
        Ok(items)
    }

    fn parse_map_literal(&mut self) -> Result<Expr> {
        self.expect_punct(TokKind::LBrace)?;
        let mut items = Vec::new();
        if self.peek().kind != TokKind::RBrace {
            loop {
                let key = self.parse_expr()?;
                self.expect_punct(TokKind::Colon)?;
                let value = self.parse_expr()?;
                items.push((key, value));
                if !self.eat_punct(TokKind::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(TokKind::RBrace)?;
        Ok(Expr::Map(items))
    }

    fn parse_cast(&mut self) -> Result<Expr> {
        self.expect_keyword("CAST")?;
        self.expect_punct(TokKind::LParen)?;
        let expr = self.parse_expr()?;
        self.expect_keyword("AS")?;
        let data_type = self.parse_data_type()?;
        self.expect_punct(TokKind::RParen)?;
        Ok(Expr::Cast { expr: Box::new(expr), data_type: Box::new(data_type) })
    }

    fn parse_interval(&mut self) -> Result<Expr> {
        self.expect_keyword("INTERVAL")?;
        let value = self.parse_additive()?;
        let unit = self.expect_ident()?;
        Ok(Expr::Interval { value: Box::new(value), unit: unit.as_str().to_string() })
    }

    fn parse_case(&mut self) -> Result<Expr> {
        self.expect_keyword("CASE")?;
        let operand = if !self.is_keyword("WHEN") { Some(Box::new(self.parse_expr()?)) } else { None };
        let mut when_then = Vec::new();
        while self.eat_keyword("WHEN") {
            let when = self.parse_expr()?;
            self.expect_keyword("THEN")?;
            let then = self.parse_expr()?;
            when_then.push((when, then));
        }
        let else_expr = if self.eat_keyword("ELSE") { Some(Box::new(self.parse_expr()?)) } else { None };
        self.expect_keyword("END")?;
        Ok(Expr::Case { operand, when_then, else_expr })
    }

    fn parse_ident_or_call(&mut self) -> Result<Expr> {
        let first = self.expect_ident()?;
        let mut parts = vec![first];
        while self.peek().kind == TokKind::Dot {
            self.advance();
            parts.push(self.expect_ident()?);
        }
        if self.peek().kind == TokKind::LParen {
            let name = parts.last().unwrap().as_str().to_string();
            let args = self.parse_paren_list(|p| p.parse_function_arg())?;
            // combinator call syntax: func(params)(args) — e.g. quantiles(0.5)(x).
            // ClickHouse keeps the two paren groups distinct; the first holds the
            // combinator's own parameters, the second the column arguments.
            if self.peek().kind == TokKind::LParen {
                let second_args = self.parse_paren_list(|p| p.parse_function_arg())?;
                return Ok(Expr::Function(FunctionCall { name, args, combinator_args: Some(second_args) }));
            }
            return Ok(Expr::Function(FunctionCall { name, args, combinator_args: None }));
        }
        if parts.len() == 1 {
            Ok(Expr::Identifier(parts.remove(0)))
        } else {
            Ok(Expr::CompoundIdentifier(parts))
        }
    }

    fn parse_function_arg(&mut self) -> Result<Expr> {
        if self.eat_punct(TokKind::Star) {
            return Ok(Expr::Wildcard);
        }
        self.parse_expr()
    }

    /// `name(args...)` used by `ENGINE =`, `SOURCE(...)`, `LAYOUT(...)`.
    pub(super) fn parse_function_call(&mut self) -> Result<FunctionCall> {
        let name = self.expect_ident()?.as_str().to_string();
        let args = if self.peek().kind == TokKind::LParen {
            self.parse_paren_list(|p| p.parse_function_arg())?
        } else {
            Vec::new()
        };
        Ok(FunctionCall { name, args, combinator_args: None })
    }

    pub(super) fn parse_data_type(&mut self) -> Result<DataType> {
        let name = self.expect_ident()?;
        let upper = name.as_str().to_ascii_uppercase();
        match upper.as_str() {
            "ARRAY" => {
                self.expect_punct(TokKind::LParen)?;
                let inner = self.parse_data_type()?;
                self.expect_punct(TokKind::RParen)?;
                Ok(DataType::Array(Box::new(inner)))
            }
            "NULLABLE" => {
                self.expect_punct(TokKind::LParen)?;
                let inner = self.parse_data_type()?;
                self.expect_punct(TokKind::RParen)?;
                Ok(DataType::Nullable(Box::new(inner)))
            }
            "LOWCARDINALITY" => {
                self.expect_punct(TokKind::LParen)?;
                let inner = self.parse_data_type()?;
                self.expect_punct(TokKind::RParen)?;
                Ok(DataType::LowCardinality(Box::new(inner)))
            }
            "MAP" => {
                self.expect_punct(TokKind::LParen)?;
                let key = self.parse_data_type()?;
                self.expect_punct(TokKind::Comma)?;
                let value = self.parse_data_type()?;
                self.expect_punct(TokKind::RParen)?;
                Ok(DataType::Map(Box::new(key), Box::new(value)))
            }
            "TUPLE" => {
                let elems = self.parse_paren_list(|p| p.parse_tuple_element())?;
                Ok(DataType::Tuple(elems))
            }
            "NESTED" => {
                let cols = self.parse_paren_list(|p| p.parse_column_def())?;
                Ok(DataType::Nested(cols))
            }
            "FIXEDSTRING" => {
                self.expect_punct(TokKind::LParen)?;
                let n: u64 = self.expect_number()?.parse().map_err(|_| self.unexpected("an integer"))?;
                self.expect_punct(TokKind::RParen)?;
                Ok(DataType::FixedString(n))
            }
            "DECIMAL" => {
                self.expect_punct(TokKind::LParen)?;
                let precision: u32 = self.expect_number()?.parse().map_err(|_| self.unexpected("an integer"))?;
                self.expect_punct(TokKind::Comma)?;
                let scale: u32 = self.expect_number()?.parse().map_err(|_| self.unexpected("an integer"))?;
                self.expect_punct(TokKind::RParen)?;
                Ok(DataType::Decimal { precision, scale })
            }
            "DATETIME64" => {
                self.expect_punct(TokKind::LParen)?;
                let precision: u32 = self.expect_number()?.parse().map_err(|_| self.unexpected("an integer"))?;
                let timezone = if self.eat_punct(TokKind::Comma) { Some(self.expect_string()?) } else { None };
                self.expect_punct(TokKind::RParen)?;
                Ok(DataType::DateTime64 { precision, timezone })
            }
            "AGGREGATEFUNCTION" | "SIMPLEAGGREGATEFUNCTION" => {
                self.expect_punct(TokKind::LParen)?;
                let function = self.parse_function_call()?;
                let mut arg_types = Vec::new();
                while self.eat_punct(TokKind::Comma) {
                    arg_types.push(self.parse_data_type()?);
                }
                self.expect_punct(TokKind::RParen)?;
                Ok(DataType::AggregateFunction { function, arg_types })
            }
            _ if self.peek().kind == TokKind::LParen => {
                let args = self.parse_paren_list(|p| p.parse_type_arg())?;
                Ok(DataType::Parametric { name: name.as_str().to_string(), args })
            }
            _ => Ok(DataType::Primitive(name.as_str().to_string()))
        }
    }

    fn parse_tuple_element(&mut self) -> Result<(Option<String>, DataType)> {
        // A named element looks like `name Type`; an unnamed one is just `Type`.
        // Disambiguate by checking whether the identifier is immediately
        // followed by something that cannot start a type on its own, i.e.
        // peek two idents ahead.
        if matches!(self.peek().kind, TokKind::Ident(_)) && matches!(self.peek_n(1).kind, TokKind::Ident(_)) {
            let name = self.expect_ident()?;
            let ty = self.parse_data_type()?;
            Ok((Some(name.as_str().to_string()), ty))
        } else {
            Ok((None, self.parse_data_type()?))
        }
    }

    fn parse_type_arg(&mut self) -> Result<TypeArg> {
        if matches!(self.peek().kind, TokKind::Str(_)) && self.peek_n(1).kind == TokKind::Eq {
            let name = self.expect_string()?;
            self.advance();
            let neg = self.eat_punct(TokKind::Minus);
            let mut n = self.expect_number()?;
            if neg {
                n = format!("-{n}");
            }
            return Ok(TypeArg::EnumMember(name, n.parse().map_err(|_| self.unexpected("an integer"))?));
        }
        match &self.peek().kind {
            TokKind::Number(_) => Ok(TypeArg::Number(self.expect_number()?)),
            TokKind::Str(_) => Ok(TypeArg::String(self.expect_string()?)),
            _ => Ok(TypeArg::Type(Box::new(self.parse_data_type()?)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_statement;

    fn expr(src: &str) -> Expr {
        let stmt = parse_statement(&format!("SELECT {src};")).unwrap();
        match stmt.kind {
            crate::ast::StatementKind::Select(s) => s.columns.into_iter().next().unwrap().expr,
            other => panic!("expected a SELECT, got {other:?}")
        }
    }

    #[test]
    fn precedence_respects_and_over_or() {
        assert_eq!(
            expr("a OR b AND c"),
            Expr::BinaryOp {
                left:  Box::new(Expr::ident("a")),
                op:    BinaryOperator::Or,
                right: Box::new(Expr::BinaryOp {
                    left:  Box::new(Expr::ident("b")),
                    op:    BinaryOperator::And,
                    right: Box::new(Expr::ident("c"))
                })
            }
        );
    }

    #[test]
    fn precedence_respects_multiplicative_over_additive() {
        assert_eq!(
            expr("1 + 2 * 3"),
            Expr::BinaryOp {
                left:  Box::new(Expr::number("1")),
                op:    BinaryOperator::Plus,
                right: Box::new(Expr::BinaryOp {
                    left:  Box::new(Expr::number("2")),
                    op:    BinaryOperator::Multiply,
                    right: Box::new(Expr::number("3"))
                })
            }
        );
    }

    #[test]
    fn parses_function_call_with_args() {
        assert_eq!(
            expr("toDate(created_at)"),
            Expr::Function(FunctionCall { name: "toDate".into(), args: vec![Expr::ident("created_at")], combinator_args: None })
        );
    }

    #[test]
    fn parses_combinator_call_with_two_paren_groups() {
        assert_eq!(
            expr("quantiles(0.5)(x)"),
            Expr::Function(FunctionCall {
                name:            "quantiles".into(),
                args:            vec![Expr::number("0.5")],
                combinator_args: Some(vec![Expr::ident("x")])
            })
        );
    }

    #[test]
    fn parses_cast() {
        assert_eq!(
            expr("CAST(x AS UInt64)"),
            Expr::Cast { expr: Box::new(Expr::ident("x")), data_type: Box::new(DataType::Primitive("UInt64".into())) }
        );
    }

    #[test]
    fn parses_nullable_array_type() {
        let stmt = parse_statement("CREATE TABLE t (id Array(Nullable(String))) ENGINE = Memory;").unwrap();
        let crate::ast::StatementKind::CreateTable(t) = stmt.kind else { panic!("expected CREATE TABLE") };
        let col = t.columns().next().unwrap();
        assert_eq!(col.data_type, DataType::Array(Box::new(DataType::Nullable(Box::new(DataType::Primitive("String".into()))))));
    }

    #[test]
    fn parses_decimal_and_datetime64() {
        let stmt =
            parse_statement("CREATE TABLE t (a Decimal(18, 4), b DateTime64(3, 'UTC')) ENGINE = Memory;").unwrap();
        let crate::ast::StatementKind::CreateTable(t) = stmt.kind else { panic!("expected CREATE TABLE") };
        let cols: Vec<_> = t.columns().collect();
        assert_eq!(cols[0].data_type, DataType::Decimal { precision: 18, scale: 4 });
        assert_eq!(cols[1].data_type, DataType::DateTime64 { precision: 3, timezone: Some("UTC".into()) });
    }

    #[test]
    fn parses_in_list_and_between() {
        assert_eq!(
            expr("x IN (1, 2, 3)"),
            Expr::InList {
                expr:    Box::new(Expr::ident("x")),
                list:    vec![Expr::number("1"), Expr::number("2"), Expr::number("3")],
                negated: false
            }
        );
        assert_eq!(
            expr("x NOT BETWEEN 1 AND 10"),
            Expr::Between {
                expr:    Box::new(Expr::ident("x")),
                negated: true,
                low:     Box::new(Expr::number("1")),
                high:    Box::new(Expr::number("10"))
            }
        );
    }
}
