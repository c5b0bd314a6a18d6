//! Expression, data-type, codec, and TTL rendering.

use super::render_ident;
use crate::ast::{
    BinaryOperator, Codec, DataType, Expr, FunctionCall, Literal, TtlAction, TtlClause, TypeArg,
    UnaryOperator, WindowSpec
};

/// Precedence levels, tightest last. Matches the parser's climbing order:
/// OR < AND < NOT < comparison < additive (+ - ||) < multiplicative (* / %)
/// < unary < postfix < primary.
const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_NOT: u8 = 3;
const PREC_CMP: u8 = 4;
const PREC_ADD: u8 = 5;
const PREC_MUL: u8 = 6;
const PREC_UNARY: u8 = 7;
const PREC_PRIMARY: u8 = 9;

pub fn render_expr(e: &Expr) -> String {
    render_expr_prec(e, 0)
}

fn render_expr_prec(e: &Expr, min_prec: u8) -> String {
    match e {
        Expr::BinaryOp { left, op, right } => {
            let prec = binop_prec(*op);
            let s = format!(
                "{} {} {}",
                render_expr_prec(left, prec),
                binop_str(*op),
                render_expr_prec(right, prec + 1)
            );
            wrap_if(s, prec, min_prec)
        }
        Expr::UnaryOp { op: UnaryOperator::Not, expr } => {
            let s = format!("NOT {}", render_expr_prec(expr, PREC_NOT));
            wrap_if(s, PREC_NOT, min_prec)
        }
        Expr::UnaryOp { op, expr } => {
            let sign = match op {
                UnaryOperator::Plus => "+",
                UnaryOperator::Minus => "-",
                UnaryOperator::Not => unreachable!()
            };
            let s = format!("{sign}{}", render_expr_prec(expr, PREC_UNARY));
            wrap_if(s, PREC_UNARY, min_prec)
        }
        Expr::IsNull { expr, negated } => {
            let s = format!(
                "{} IS {}NULL",
                render_expr_prec(expr, PREC_ADD),
                if *negated { "NOT " } else { "" }
            );
            wrap_if(s, PREC_CMP, min_prec)
        }
        Expr::InList { expr, list, negated } => {
            let items: Vec<_> = list.iter().map(render_expr).collect();
            let s = format!(
                "{} {}IN ({})",
                render_expr_prec(expr, PREC_ADD),
                if *negated { "NOT " } else { "" },
                items.join(", ")
            );
            wrap_if(s, PREC_CMP, min_prec)
        }
        Expr::Between { expr, negated, low, high } => {
            let s = format!(
                "{} {}BETWEEN {} AND {}",
                render_expr_prec(expr, PREC_ADD),
                if *negated { "NOT " } else { "" },
                render_expr_prec(low, PREC_ADD),
                render_expr_prec(high, PREC_ADD)
            );
            wrap_if(s, PREC_CMP, min_prec)
        }
        Expr::Literal(lit) => render_literal(lit),
        Expr::Identifier(ident) => render_ident(ident),
        Expr::CompoundIdentifier(parts) => {
            parts.iter().map(render_ident).collect::<Vec<_>>().join(".")
        }
        Expr::Function(call) => render_function_call(call),
        Expr::Cast { expr, data_type } => {
            format!("CAST({} AS {})", render_expr(expr), render_data_type(data_type))
        }
        Expr::Interval { value, unit } => format!("INTERVAL {} {unit}", render_expr(value)),
        Expr::Array(items) => {
            format!("[{}]", items.iter().map(render_expr).collect::<Vec<_>>().join(", "))
        }
        Expr::Tuple(items) => {
            format!("({})", items.iter().map(render_expr).collect::<Vec<_>>().join(", "))
        }
        Expr::Map(pairs) => {
            let parts: Vec<_> =
                pairs.iter().map(|(k, v)| format!("{}: {}", render_expr(k), render_expr(v))).collect();
            format!("{{{}}}", parts.join(", "))
        }
        Expr::Nested(inner) => format!("({})", render_expr(inner)),
        Expr::Subquery(select) => format!("({})", super::ddl::render_select(select)),
        Expr::Wildcard => "*".to_string(),
        Expr::Case { operand, when_then, else_expr } => render_case(operand, when_then, else_expr),
        Expr::Window { function, spec } => {
            format!("{} OVER ({})", render_expr(function), render_window_spec(spec))
        }
    }
}

fn wrap_if(s: String, prec: u8, min_prec: u8) -> String {
    if prec < min_prec { format!("({s})") } else { s }
}

fn binop_prec(op: BinaryOperator) -> u8 {
    use BinaryOperator::*;
    match op {
        Or => PREC_OR,
        And => PREC_AND,
        Eq | NotEq | Lt | LtEq | Gt | GtEq | Like | NotLike => PREC_CMP,
        Plus | Minus | Concat => PREC_ADD,
        Multiply | Divide | Modulo => PREC_MUL
    }
}

fn binop_str(op: BinaryOperator) -> &'static str {
    use BinaryOperator::*;
    match op {
        Plus => "+",
        Minus => "-",
        Multiply => "*",
        Divide => "/",
        Modulo => "%",
        Eq => "=",
        NotEq => "<>",
        Lt => "<",
        LtEq => "<=",
        Gt => ">",
        GtEq => ">=",
        And => "AND",
        Or => "OR",
        Like => "LIKE",
        NotLike => "NOT LIKE",
        Concat => "||"
    }
}

fn render_literal(lit: &Literal) -> String {
    match lit {
        Literal::Number(n) => n.clone(),
        Literal::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Literal::Bool(true) => "TRUE".to_string(),
        Literal::Bool(false) => "FALSE".to_string(),
        Literal::Null => "NULL".to_string()
    }
}

pub fn render_function_call(call: &FunctionCall) -> String {
    let base = format!("{}({})", call.name, call.args.iter().map(render_expr).collect::<Vec<_>>().join(", "));
    match &call.combinator_args {
        Some(args) => format!("{base}({})", args.iter().map(render_expr).collect::<Vec<_>>().join(", ")),
        None => base
    }
}

fn render_case(
    operand: &Option<Box<Expr>>,
    when_then: &[(Expr, Expr)],
    else_expr: &Option<Box<Expr>>
) -> String {
    let mut out = String::from("CASE");
    if let Some(op) = operand {
        out.push(' ');
        out.push_str(&render_expr(op));
    }
    for (when, then) in when_then {
        out.push_str(&format!(" WHEN {} THEN {}", render_expr(when), render_expr(then)));
    }
    if let Some(e) = else_expr {
        out.push_str(&format!(" ELSE {}", render_expr(e)));
    }
    out.push_str(" END");
    out
}

pub fn render_window_spec(spec: &WindowSpec) -> String {
    let mut parts = Vec::new();
    if !spec.partition_by.is_empty() {
        parts.push(format!(
            "PARTITION BY {}",
            spec.partition_by.iter().map(render_expr).collect::<Vec<_>>().join(", ")
        ));
    }
    if !spec.order_by.is_empty() {
        parts.push(format!("ORDER BY {}", super::ddl::render_order_by_items(&spec.order_by)));
    }
    parts.join(" ")
}

pub fn render_data_type(t: &DataType) -> String {
    match t {
        DataType::Primitive(name) => name.clone(),
        DataType::Parametric { name, args } => {
            format!("{name}({})", args.iter().map(render_type_arg).collect::<Vec<_>>().join(", "))
        }
        DataType::Array(inner) => format!("Array({})", render_data_type(inner)),
        DataType::Nullable(inner) => format!("Nullable({})", render_data_type(inner)),
        DataType::LowCardinality(inner) => format!("LowCardinality({})", render_data_type(inner)),
        DataType::Map(k, v) => format!("Map({}, {})", render_data_type(k), render_data_type(v)),
        DataType::Tuple(elements) => {
            let parts: Vec<_> = elements
                .iter()
                .map(|(name, ty)| match name {
                    Some(n) => format!("{n} {}", render_data_type(ty)),
                    None => render_data_type(ty)
                })
                .collect();
            format!("Tuple({})", parts.join(", "))
        }
        DataType::Nested(columns) => {
            let parts: Vec<_> = columns
                .iter()
                .map(|c| format!("{} {}", render_ident(&c.name), render_data_type(&c.data_type)))
                .collect();
            format!("Nested({})", parts.join(", "))
        }
        DataType::FixedString(n) => format!("FixedString({n})"),
        DataType::Decimal { precision, scale } => format!("Decimal({precision}, {scale})"),
        DataType::DateTime64 { precision, timezone } => match timezone {
            Some(tz) => format!("DateTime64({precision}, '{tz}')"),
            None => format!("DateTime64({precision})")
        },
        DataType::AggregateFunction { function, arg_types } => {
            let mut parts = vec![render_function_call(function)];
            parts.extend(arg_types.iter().map(render_data_type));
            format!("AggregateFunction({})", parts.join(", "))
        }
    }
}

fn render_type_arg(arg: &TypeArg) -> String {
    match arg {
        TypeArg::Number(n) => n.clone(),
        TypeArg::String(s) => format!("'{}'", s.replace('\'', "\\'")),
        TypeArg::Type(t) => render_data_type(t),
        TypeArg::EnumMember(name, value) => format!("'{name}' = {value}")
    }
}

pub fn render_codec(codec: &Codec) -> String {
    let parts: Vec<_> = codec
        .parts
        .iter()
        .map(|p| {
            if p.args.is_empty() {
                p.name.clone()
            } else {
                format!("{}({})", p.name, p.args.iter().map(render_expr).collect::<Vec<_>>().join(", "))
            }
        })
        .collect();
    format!("CODEC({})", parts.join(", "))
}

pub fn render_ttl_clause(ttl: &TtlClause) -> String {
    ttl.items
        .iter()
        .map(|item| {
            let mut s = render_expr(&item.expr);
            match &item.action {
                Some(TtlAction::Delete) => s.push_str(" DELETE"),
                Some(TtlAction::ToDisk(name)) => s.push_str(&format!(" TO DISK '{name}'")),
                Some(TtlAction::ToVolume(name)) => s.push_str(&format!(" TO VOLUME '{name}'")),
                None => {}
            }
            s
        })
        .collect::<Vec<_>>()
        .join(", ")
}
