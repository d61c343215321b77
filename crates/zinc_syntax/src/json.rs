//! Syntax dump loader.
//!
//! The parser collaborator hands over each module as a JSON document of
//! `{"kind": "...", ...}` objects. Every object may carry
//! `"pos": [line, col, endLine, endCol]`; missing positions inherit the
//! parent's. Field names match the `SyntaxKind` payload names.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::node::*;
use crate::types::*;
use zinc_core::arena::SyntaxArena;
use zinc_core::intern::{Ident, IdentTable};
use zinc_core::text::{FileId, LineCol, SourcePos};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected an object for {0}")]
    ExpectedObject(&'static str),
    #[error("{kind} node is missing field `{field}`")]
    MissingField { kind: String, field: &'static str },
    #[error("unknown syntax kind `{0}`")]
    UnknownKind(String),
    #[error("invalid value for `{field}`: expected {expected}")]
    InvalidValue {
        field: &'static str,
        expected: &'static str,
    },
}

type Result<T> = std::result::Result<T, LoadError>;

/// Parse `text` and load it as one module.
pub fn load_module<'a>(
    arena: &'a SyntaxArena,
    idents: &IdentTable,
    file: FileId,
    text: &str,
) -> Result<&'a ModuleSyntax<'a>> {
    let value: Value = serde_json::from_str(text)?;
    Loader::new(arena, idents, file).module(&value, SourcePos::line(file, 1, 1, 1))
}

struct Loader<'a, 't> {
    arena: &'a SyntaxArena,
    idents: &'t IdentTable,
    file: FileId,
}

/// One JSON object with the accessors the loader needs.
struct Fields<'v> {
    kind: &'v str,
    map: &'v Map<String, Value>,
}

impl<'v> Fields<'v> {
    fn new(value: &'v Value, what: &'static str) -> Result<Self> {
        let map = value.as_object().ok_or(LoadError::ExpectedObject(what))?;
        let kind = map.get("kind").and_then(Value::as_str).unwrap_or(what);
        Ok(Self { kind, map })
    }

    fn get(&self, field: &'static str) -> Option<&'v Value> {
        self.map.get(field).filter(|value| !value.is_null())
    }

    fn require(&self, field: &'static str) -> Result<&'v Value> {
        self.get(field).ok_or_else(|| LoadError::MissingField {
            kind: self.kind.to_string(),
            field,
        })
    }

    fn str(&self, field: &'static str) -> Result<&'v str> {
        self.require(field)?.as_str().ok_or(LoadError::InvalidValue {
            field,
            expected: "a string",
        })
    }

    fn opt_str(&self, field: &'static str) -> Result<Option<&'v str>> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => value.as_str().map(Some).ok_or(LoadError::InvalidValue {
                field,
                expected: "a string",
            }),
        }
    }

    fn flag(&self, field: &'static str) -> bool {
        self.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    fn array(&self, field: &'static str) -> Result<&'v [Value]> {
        match self.get(field) {
            None => Ok(&[]),
            Some(value) => value
                .as_array()
                .map(Vec::as_slice)
                .ok_or(LoadError::InvalidValue {
                    field,
                    expected: "an array",
                }),
        }
    }
}

impl<'a, 't> Loader<'a, 't> {
    fn new(arena: &'a SyntaxArena, idents: &'t IdentTable, file: FileId) -> Self {
        Self { arena, idents, file }
    }

    fn ident(&self, name: &str) -> Ident {
        self.idents.intern(name)
    }

    fn pos(&self, fields: &Fields<'_>, parent: SourcePos) -> Result<SourcePos> {
        let Some(value) = fields.get("pos") else {
            return Ok(parent);
        };
        let numbers = value
            .as_array()
            .filter(|items| items.len() == 4)
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_u64().map(|n| n as u32))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or(LoadError::InvalidValue {
                field: "pos",
                expected: "[line, col, endLine, endCol]",
            })?;
        Ok(SourcePos::new(
            self.file,
            LineCol::new(numbers[0], numbers[1]),
            LineCol::new(numbers[2], numbers[3]).max(LineCol::new(numbers[0], numbers[1])),
        ))
    }

    fn module(&self, value: &Value, parent: SourcePos) -> Result<&'a ModuleSyntax<'a>> {
        let fields = Fields::new(value, "Module")?;
        let pos = self.pos(&fields, parent)?;
        let name = self.ident(fields.str("name")?);
        let body = self.list(fields.array("body")?, pos)?;
        Ok(self.arena.alloc(ModuleSyntax { pos, name, body }))
    }

    fn list(&self, values: &[Value], parent: SourcePos) -> Result<SyntaxList<'a>> {
        let nodes = values
            .iter()
            .map(|value| self.node(value, parent))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.arena.alloc_vec(nodes))
    }

    fn child(&self, fields: &Fields<'_>, field: &'static str, pos: SourcePos) -> Result<SyntaxRef<'a>> {
        self.node(fields.require(field)?, pos)
    }

    fn opt_child(
        &self,
        fields: &Fields<'_>,
        field: &'static str,
        pos: SourcePos,
    ) -> Result<Option<SyntaxRef<'a>>> {
        fields.get(field).map(|value| self.node(value, pos)).transpose()
    }

    fn opt_ident(&self, fields: &Fields<'_>, field: &'static str) -> Result<Option<Ident>> {
        Ok(fields.opt_str(field)?.map(|name| self.ident(name)))
    }

    fn modifiers(&self, fields: &Fields<'_>) -> Result<Modifiers> {
        let mut modifiers = Modifiers::NONE;
        for value in fields.array("modifiers")? {
            let keyword = value.as_str().and_then(Modifiers::from_keyword).ok_or(
                LoadError::InvalidValue {
                    field: "modifiers",
                    expected: "a modifier keyword",
                },
            )?;
            modifiers |= keyword;
        }
        Ok(modifiers)
    }

    fn arguments(
        &self,
        fields: &Fields<'_>,
        field: &'static str,
        parent: SourcePos,
    ) -> Result<&'a [Argument<'a>]> {
        let mut args = Vec::new();
        for value in fields.array(field)? {
            let arg = Fields::new(value, "Argument")?;
            // Bare nodes are positional arguments.
            if arg.kind != "Argument" {
                let value = self.node(value, parent)?;
                args.push(Argument {
                    pos: value.pos,
                    name: None,
                    value,
                });
                continue;
            }
            let pos = self.pos(&arg, parent)?;
            args.push(Argument {
                pos,
                name: self.opt_ident(&arg, "name")?,
                value: self.child(&arg, "value", pos)?,
            });
        }
        Ok(self.arena.alloc_vec(args))
    }

    fn params(&self, fields: &Fields<'_>, parent: SourcePos) -> Result<&'a [Param<'a>]> {
        let mut params = Vec::new();
        for value in fields.array("params")? {
            let param = Fields::new(value, "Param")?;
            let pos = self.pos(&param, parent)?;
            params.push(Param {
                pos,
                name: self.ident(param.str("name")?),
                ty: self.opt_child(&param, "type", pos)?,
                default: self.opt_child(&param, "default", pos)?,
                vararg: param.flag("vararg"),
                is_const: param.flag("const"),
            });
        }
        Ok(self.arena.alloc_vec(params))
    }

    fn function(&self, fields: &Fields<'_>, pos: SourcePos) -> Result<&'a FunctionSyntax<'a>> {
        let kind = match fields.opt_str("functionKind")? {
            None if fields.kind == "Lambda" => FunctionKind::Lambda,
            None | Some("plain") => FunctionKind::Plain,
            Some("lambda") => FunctionKind::Lambda,
            Some("generator") => FunctionKind::Generator,
            Some(_) => {
                return Err(LoadError::InvalidValue {
                    field: "functionKind",
                    expected: "plain, lambda or generator",
                })
            }
        };
        let operator = match fields.opt_str("operator")? {
            None => None,
            Some(symbol) => Some(
                BinaryOp::from_symbol(symbol)
                    .map(OperatorName::Binary)
                    .or_else(|| UnaryOp::from_symbol(symbol).map(OperatorName::Unary))
                    .ok_or(LoadError::InvalidValue {
                        field: "operator",
                        expected: "an operator symbol",
                    })?,
            ),
        };
        let body = match fields.get("body") {
            None => None,
            Some(_) => Some(self.list(fields.array("body")?, pos)?),
        };
        Ok(self.arena.alloc(FunctionSyntax {
            pos,
            name: self.opt_ident(fields, "name")?,
            operator,
            kind,
            params: self.params(fields, pos)?,
            return_type: self.opt_child(fields, "returnType", pos)?,
            body,
            modifiers: self.modifiers(fields)?,
        }))
    }

    fn label(&self, fields: &Fields<'_>) -> Result<Option<Ident>> {
        self.opt_ident(fields, "label")
    }

    fn node(&self, value: &Value, parent: SourcePos) -> Result<SyntaxRef<'a>> {
        let fields = Fields::new(value, "node")?;
        let pos = self.pos(&fields, parent)?;
        let kind = match fields.str("kind")? {
            "IntLiteral" => {
                let value = fields.require("value")?.as_u64().ok_or(LoadError::InvalidValue {
                    field: "value",
                    expected: "an unsigned integer",
                })?;
                let suffix = match fields.opt_str("suffix")? {
                    None => None,
                    Some(suffix) => Some(IntSuffix::parse(suffix).ok_or(
                        LoadError::InvalidValue {
                            field: "suffix",
                            expected: "an integer suffix",
                        },
                    )?),
                };
                SyntaxKind::IntLiteral { value, suffix }
            }
            "FloatLiteral" => SyntaxKind::FloatLiteral {
                value: fields.require("value")?.as_f64().ok_or(LoadError::InvalidValue {
                    field: "value",
                    expected: "a number",
                })?,
                single: fields.flag("single"),
            },
            "BoolLiteral" => SyntaxKind::BoolLiteral(fields.flag("value")),
            "NullLiteral" => SyntaxKind::NullLiteral,
            "StringLiteral" => SyntaxKind::StringLiteral(self.arena.alloc_str(fields.str("value")?)),
            "Name" => SyntaxKind::Name(self.ident(fields.str("name")?)),
            "Dot" => SyntaxKind::Dot {
                base: self.child(&fields, "base", pos)?,
                member: self.ident(fields.str("member")?),
            },
            "Index" => SyntaxKind::Index {
                base: self.child(&fields, "base", pos)?,
                index: self.child(&fields, "index", pos)?,
            },
            "Unary" => SyntaxKind::Unary {
                op: UnaryOp::from_symbol(fields.str("op")?).ok_or(LoadError::InvalidValue {
                    field: "op",
                    expected: "a unary operator",
                })?,
                operand: self.child(&fields, "operand", pos)?,
            },
            "Binary" => SyntaxKind::Binary {
                op: binary_op(fields.str("op")?)?,
                left: self.child(&fields, "left", pos)?,
                right: self.child(&fields, "right", pos)?,
            },
            "Assign" => SyntaxKind::Assign {
                op: fields.opt_str("op")?.map(binary_op).transpose()?,
                target: self.child(&fields, "target", pos)?,
                value: self.child(&fields, "value", pos)?,
            },
            "Ternary" => SyntaxKind::Ternary {
                cond: self.child(&fields, "cond", pos)?,
                then: self.child(&fields, "then", pos)?,
                otherwise: self.child(&fields, "otherwise", pos)?,
            },
            "Cast" => SyntaxKind::Cast {
                value: self.child(&fields, "value", pos)?,
                target: self.child(&fields, "target", pos)?,
                kind: match fields.opt_str("cast")? {
                    None | Some("as") => CastSyntax::As,
                    Some("to") => CastSyntax::To,
                    Some(_) => {
                        return Err(LoadError::InvalidValue {
                            field: "cast",
                            expected: "`as` or `to`",
                        })
                    }
                },
            },
            "Call" => SyntaxKind::Call {
                callee: self.child(&fields, "callee", pos)?,
                args: self.arguments(&fields, "args", pos)?,
                with: self.opt_child(&fields, "with", pos)?,
            },
            "Initializer" => SyntaxKind::Initializer {
                ty: self.child(&fields, "type", pos)?,
                fields: self.arguments(&fields, "fields", pos)?,
            },
            "Tuple" => SyntaxKind::Tuple(self.list(fields.array("items")?, pos)?),
            "SizeOf" => SyntaxKind::SizeOf(self.child(&fields, "target", pos)?),
            "New" => SyntaxKind::New {
                ty: self.child(&fields, "type", pos)?,
                count: self.opt_child(&fields, "count", pos)?,
                args: self.arguments(&fields, "args", pos)?,
            },
            "Delete" => SyntaxKind::Delete(self.child(&fields, "value", pos)?),
            "Atomic" => SyntaxKind::Atomic {
                op: AtomicOp::from_name(fields.str("op")?).ok_or(LoadError::InvalidValue {
                    field: "op",
                    expected: "an atomic operation name",
                })?,
                target: self.child(&fields, "target", pos)?,
                value: self.child(&fields, "value", pos)?,
            },
            "Lambda" => SyntaxKind::Lambda(self.function(&fields, pos)?),
            "PointerType" => SyntaxKind::PointerType(self.child(&fields, "pointee", pos)?),
            "ReferenceType" => SyntaxKind::ReferenceType(self.child(&fields, "pointee", pos)?),
            "ArrayType" => SyntaxKind::ArrayType {
                element: self.child(&fields, "element", pos)?,
                length: self.child(&fields, "length", pos)?,
            },
            "Define" => SyntaxKind::Define {
                name: self.ident(fields.str("name")?),
                ty: self.opt_child(&fields, "type", pos)?,
                value: self.opt_child(&fields, "value", pos)?,
                modifiers: self.modifiers(&fields)?,
            },
            "Function" => SyntaxKind::Function(self.function(&fields, pos)?),
            "Struct" => {
                let kind = match fields.opt_str("structKind")? {
                    None | Some("struct") => StructSyntaxKind::Struct,
                    Some("tuple") => StructSyntaxKind::Tuple,
                    Some("union") => StructSyntaxKind::Union,
                    Some(_) => {
                        return Err(LoadError::InvalidValue {
                            field: "structKind",
                            expected: "struct, tuple or union",
                        })
                    }
                };
                SyntaxKind::Struct(self.arena.alloc(StructSyntax {
                    pos,
                    name: self.opt_ident(&fields, "name")?,
                    kind,
                    params: self.params(&fields, pos)?,
                    body: self.list(fields.array("body")?, pos)?,
                    modifiers: self.modifiers(&fields)?,
                }))
            }
            "Enum" => {
                let mut members = Vec::new();
                for value in fields.array("members")? {
                    let member = Fields::new(value, "EnumMember")?;
                    let member_pos = self.pos(&member, pos)?;
                    members.push(EnumMember {
                        pos: member_pos,
                        name: self.ident(member.str("name")?),
                        value: self.opt_child(&member, "value", member_pos)?,
                    });
                }
                SyntaxKind::Enum(self.arena.alloc(EnumSyntax {
                    pos,
                    name: self.ident(fields.str("name")?),
                    base: self.opt_child(&fields, "base", pos)?,
                    members: self.arena.alloc_vec(members),
                }))
            }
            "Alias" => SyntaxKind::Alias {
                name: self.ident(fields.str("name")?),
                target: self.child(&fields, "target", pos)?,
            },
            "Import" => {
                let path = fields
                    .str("path")?
                    .split('.')
                    .map(|part| self.ident(part))
                    .collect::<Vec<_>>();
                SyntaxKind::Import {
                    path: self.arena.alloc_vec(path),
                    alias: self.opt_ident(&fields, "alias")?,
                }
            }
            "Export" => SyntaxKind::Export {
                name: self.ident(fields.str("name")?),
                target: self.child(&fields, "target", pos)?,
            },
            "Module" => SyntaxKind::Module(self.module(value, pos)?),
            "Extern" => SyntaxKind::Extern {
                abi: self.arena.alloc_str(fields.opt_str("abi")?.unwrap_or("C")),
                body: self.list(fields.array("body")?, pos)?,
            },
            "Modified" => SyntaxKind::Modified {
                modifiers: self.modifiers(&fields)?,
                body: self.list(fields.array("body")?, pos)?,
            },
            "Block" => SyntaxKind::Block {
                label: self.label(&fields)?,
                body: self.list(fields.array("body")?, pos)?,
            },
            "If" => SyntaxKind::If {
                cond: self.child(&fields, "cond", pos)?,
                then: self.child(&fields, "then", pos)?,
                otherwise: self.opt_child(&fields, "otherwise", pos)?,
            },
            "Loop" => SyntaxKind::Loop {
                label: self.label(&fields)?,
                init: self.opt_child(&fields, "init", pos)?,
                cond: self.opt_child(&fields, "cond", pos)?,
                step: self.opt_child(&fields, "step", pos)?,
                body: self.child(&fields, "body", pos)?,
            },
            "ForIn" => SyntaxKind::ForIn {
                label: self.label(&fields)?,
                name: self.ident(fields.str("name")?),
                iterable: self.child(&fields, "iterable", pos)?,
                body: self.child(&fields, "body", pos)?,
            },
            "Return" => SyntaxKind::Return(self.opt_child(&fields, "value", pos)?),
            "Break" => SyntaxKind::Break(self.label(&fields)?),
            "Continue" => SyntaxKind::Continue(self.label(&fields)?),
            "Defer" => SyntaxKind::Defer(self.child(&fields, "value", pos)?),
            "Yield" => SyntaxKind::Yield(self.child(&fields, "value", pos)?),
            "YieldFrom" => SyntaxKind::YieldFrom(self.child(&fields, "value", pos)?),
            "Await" => SyntaxKind::Await(self.child(&fields, "value", pos)?),
            other => return Err(LoadError::UnknownKind(other.to_string())),
        };
        Ok(self.arena.alloc(Syntax { pos, kind }))
    }
}

fn binary_op(symbol: &str) -> Result<BinaryOp> {
    BinaryOp::from_symbol(symbol).ok_or(LoadError::InvalidValue {
        field: "op",
        expected: "a binary operator",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_is_reported() {
        let arena = SyntaxArena::new();
        let idents = IdentTable::init();
        let text = r#"{"kind": "Module", "name": "m", "body": [{"kind": "Binary", "op": "+"}]}"#;
        let err = load_module(&arena, &idents, FileId(0), text).unwrap_err();
        assert!(matches!(err, LoadError::MissingField { field: "left", .. }));
    }

    #[test]
    fn test_positions_inherit() {
        let arena = SyntaxArena::new();
        let idents = IdentTable::init();
        let text = r#"{"kind": "Module", "name": "m", "body": [
            {"kind": "Return", "pos": [4, 2, 4, 10], "value": {"kind": "IntLiteral", "value": 3}}
        ]}"#;
        let module = load_module(&arena, &idents, FileId(0), text).unwrap();
        let SyntaxKind::Return(Some(value)) = &module.body[0].kind else {
            panic!("expected return");
        };
        assert_eq!(value.pos.start, LineCol::new(4, 2));
    }
}
