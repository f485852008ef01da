use itertools::Itertools;

use crate::aggregate::ParamInterner;
use crate::collection::Document;
use crate::common::{SortOrder, Value};
use crate::errors::{ErrorKind, LutraError, LutraResult};

/// Operators allowed in `$group` value expressions. The first five
/// accumulate over the documents of a group; the rest are scalar arithmetic.
const ACCUMULATOR_OPS: [&str; 5] = ["$sum", "$avg", "$min", "$max", "$count"];
const SCALAR_OPS: [&str; 4] = ["$add", "$subtract", "$multiply", "$divide"];

fn parse_error(message: String) -> LutraError {
    log::error!("{}", message);
    LutraError::new(&message, ErrorKind::ParseError)
}

/// One canonical pipeline stage.
pub(crate) enum Stage {
    Match(MatchStage),
    Group(GroupStage),
    Sort(SortStage),
}

impl Stage {
    /// Parses a single-key stage document (`{"$match": {…}}`).
    pub fn parse(stage_doc: &Document) -> LutraResult<Stage> {
        if stage_doc.len() != 1 {
            return Err(parse_error(format!(
                "A pipeline stage must have exactly one key, got {}",
                stage_doc.len()
            )));
        }
        let (key, value) = match stage_doc.iter().next() {
            Some(entry) => entry,
            None => return Err(parse_error("Empty pipeline stage".to_string())),
        };
        let operand = value.as_document().ok_or_else(|| {
            parse_error(format!("{} stage operand must be a document", key))
        })?;

        match key.as_str() {
            "$match" => Ok(Stage::Match(MatchStage::parse(operand)?)),
            "$group" => Ok(Stage::Group(GroupStage::parse(operand)?)),
            "$sort" => Ok(Stage::Sort(SortStage::parse(operand)?)),
            other => Err(parse_error(format!("Unknown pipeline stage {}", other))),
        }
    }

    pub fn render(&self, interner: &mut ParamInterner) -> String {
        match self {
            Stage::Match(stage) => stage.render(interner),
            Stage::Group(stage) => stage.render(interner),
            Stage::Sort(stage) => stage.render(),
        }
    }
}

/// Comparison operators of the `$match` grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Regex,
}

impl CmpOp {
    fn from_token(token: &str) -> Option<CmpOp> {
        match token {
            "$eq" => Some(CmpOp::Eq),
            "$ne" => Some(CmpOp::Ne),
            "$gt" => Some(CmpOp::Gt),
            "$gte" => Some(CmpOp::Gte),
            "$lt" => Some(CmpOp::Lt),
            "$lte" => Some(CmpOp::Lte),
            "$regex" => Some(CmpOp::Regex),
            _ => None,
        }
    }

    fn token(&self) -> &'static str {
        match self {
            CmpOp::Eq => "$eq",
            CmpOp::Ne => "$ne",
            CmpOp::Gt => "$gt",
            CmpOp::Gte => "$gte",
            CmpOp::Lt => "$lt",
            CmpOp::Lte => "$lte",
            CmpOp::Regex => "$regex",
        }
    }
}

/// The condition tree of a `$match` stage.
pub(crate) enum MatchCondition {
    Cmp {
        field: String,
        op: CmpOp,
        value: Value,
    },
    And(Vec<MatchCondition>),
    Or(Vec<MatchCondition>),
}

/// A `$match` stage: the parsed condition tree for rendering plus the
/// original filter document, which execution hands to the predicate engine
/// so both entry points share one evaluation path.
pub(crate) struct MatchStage {
    raw: Document,
    condition: Option<MatchCondition>,
}

impl MatchStage {
    fn parse(operand: &Document) -> LutraResult<MatchStage> {
        let mut conditions = parse_conditions(operand)?;
        let condition = match conditions.len() {
            0 => None,
            1 => Some(conditions.remove(0)),
            _ => Some(MatchCondition::And(conditions)),
        };
        Ok(MatchStage {
            raw: operand.clone(),
            condition,
        })
    }

    pub fn filter_document(&self) -> &Document {
        &self.raw
    }

    fn render(&self, interner: &mut ParamInterner) -> String {
        match &self.condition {
            None => "$match: {}".to_string(),
            Some(condition) => format!("$match: {{{}}}", render_condition(condition, interner)),
        }
    }
}

fn parse_conditions(operand: &Document) -> LutraResult<Vec<MatchCondition>> {
    let mut conditions = Vec::new();
    for (key, value) in operand.iter() {
        match key.as_str() {
            "$and" | "$or" => {
                let branches = value.as_array().ok_or_else(|| {
                    parse_error(format!("{} requires an array of filter documents", key))
                })?;
                let mut parsed_branches = Vec::with_capacity(branches.len());
                for branch in branches {
                    let branch_doc = branch.as_document().ok_or_else(|| {
                        parse_error(format!("{} branches must be filter documents", key))
                    })?;
                    let mut branch_conditions = parse_conditions(branch_doc)?;
                    parsed_branches.push(match branch_conditions.len() {
                        1 => branch_conditions.remove(0),
                        _ => MatchCondition::And(branch_conditions),
                    });
                }
                conditions.push(if key == "$and" {
                    MatchCondition::And(parsed_branches)
                } else {
                    MatchCondition::Or(parsed_branches)
                });
            }
            field if field.starts_with('$') => {
                return Err(parse_error(format!("Unknown match operator {}", field)));
            }
            field => match operator_entries(value) {
                Some(entries) => {
                    for (op_token, op_value) in entries {
                        let op = CmpOp::from_token(op_token).ok_or_else(|| {
                            parse_error(format!(
                                "Unknown match operator {} for field {}",
                                op_token, field
                            ))
                        })?;
                        conditions.push(MatchCondition::Cmp {
                            field: field.to_string(),
                            op,
                            value: op_value.clone(),
                        });
                    }
                }
                None => conditions.push(MatchCondition::Cmp {
                    field: field.to_string(),
                    op: CmpOp::Eq,
                    value: value.clone(),
                }),
            },
        }
    }
    Ok(conditions)
}

fn operator_entries(value: &Value) -> Option<Vec<(&str, &Value)>> {
    let doc = value.as_document()?;
    if doc.is_empty() || !doc.keys().all(|k| k.starts_with('$')) {
        return None;
    }
    Some(doc.iter().map(|(k, v)| (k.as_str(), v)).collect())
}

fn render_condition(condition: &MatchCondition, interner: &mut ParamInterner) -> String {
    match condition {
        MatchCondition::Cmp { field, op, value } => {
            // field references stay verbatim; only literals are interned
            let operand = match value {
                Value::String(s) if s.starts_with('$') => format!("\"{}\"", s),
                literal => format!("#{}", interner.intern(literal)),
            };
            format!("\"{}\": {{{}: {}}}", field, op.token(), operand)
        }
        MatchCondition::And(children) => format!(
            "$and: [{}]",
            children
                .iter()
                .map(|c| render_condition(c, interner))
                .join(", ")
        ),
        MatchCondition::Or(children) => format!(
            "$or: [{}]",
            children
                .iter()
                .map(|c| render_condition(c, interner))
                .join(", ")
        ),
    }
}

/// A value expression in a `$group` stage: a `$`-prefixed field reference,
/// an interned literal, or an operator expression whose arguments are each
/// classified independently.
pub(crate) enum GroupExpr {
    FieldRef(String),
    Literal(Value),
    Expr { op: String, args: Vec<GroupExpr> },
}

pub(crate) struct GroupStage {
    fields: Vec<(String, GroupExpr)>,
}

impl GroupStage {
    fn parse(operand: &Document) -> LutraResult<GroupStage> {
        let mut fields = Vec::with_capacity(operand.len());
        for (key, value) in operand.iter() {
            fields.push((key.clone(), classify_expr(value)?));
        }
        Ok(GroupStage { fields })
    }

    pub fn fields(&self) -> &[(String, GroupExpr)] {
        &self.fields
    }

    fn render(&self, interner: &mut ParamInterner) -> String {
        format!(
            "$group: {{{}}}",
            self.fields
                .iter()
                .map(|(key, expr)| format!("{}: {}", key, render_group_expr(expr, interner)))
                .join(", ")
        )
    }
}

fn classify_expr(value: &Value) -> LutraResult<GroupExpr> {
    match value {
        Value::String(s) if s.starts_with('$') => Ok(GroupExpr::FieldRef(s.clone())),
        Value::Document(doc) if doc.len() == 1 => {
            let (op, operand) = match doc.iter().next() {
                Some(entry) => entry,
                None => return Ok(GroupExpr::Literal(value.clone())),
            };
            if !op.starts_with('$') {
                return Ok(GroupExpr::Literal(value.clone()));
            }
            if !ACCUMULATOR_OPS.contains(&op.as_str()) && !SCALAR_OPS.contains(&op.as_str()) {
                return Err(parse_error(format!("Unknown group operator {}", op)));
            }
            let args = match operand {
                Value::Array(items) => items
                    .iter()
                    .map(classify_expr)
                    .collect::<LutraResult<Vec<_>>>()?,
                single => vec![classify_expr(single)?],
            };
            Ok(GroupExpr::Expr {
                op: op.clone(),
                args,
            })
        }
        other => Ok(GroupExpr::Literal(other.clone())),
    }
}

fn render_group_expr(expr: &GroupExpr, interner: &mut ParamInterner) -> String {
    match expr {
        GroupExpr::FieldRef(name) => format!("\"{}\"", name),
        GroupExpr::Literal(value) => format!("#{}", interner.intern(value)),
        GroupExpr::Expr { op, args } => {
            if args.len() == 1 {
                format!("{{{}: {}}}", op, render_group_expr(&args[0], interner))
            } else {
                format!(
                    "{{{}: [{}]}}",
                    op,
                    args.iter().map(|a| render_group_expr(a, interner)).join(", ")
                )
            }
        }
    }
}

pub(crate) struct SortStage {
    keys: Vec<(String, SortOrder)>,
}

impl SortStage {
    fn parse(operand: &Document) -> LutraResult<SortStage> {
        let mut keys = Vec::with_capacity(operand.len());
        for (key, value) in operand.iter() {
            let direction = value
                .as_int()
                .and_then(SortOrder::from_direction)
                .ok_or_else(|| {
                    parse_error(format!(
                        "$sort direction for {} must be 1 or -1, got {}",
                        key, value
                    ))
                })?;
            keys.push((key.clone(), direction));
        }
        Ok(SortStage { keys })
    }

    pub fn keys(&self) -> &[(String, SortOrder)] {
        &self.keys
    }

    fn render(&self) -> String {
        format!(
            "$sort: {{{}}}",
            self.keys
                .iter()
                .map(|(key, order)| format!("{}: {}", key, order.direction()))
                .join(", ")
        )
    }
}
