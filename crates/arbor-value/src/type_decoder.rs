//! Type descriptor reading and skipping.
//!
//! Struct type names are pushed onto a stack while their field types are
//! read, so a `Cycle` back-reference is checked against the structs that
//! actually enclose it. Anonymous structs are pushed too but can never be a
//! cycle target.

use arbor_types::Kind;

use crate::decoder::ValueDecoder;
use crate::error::{ValueError, ValueResult};
use crate::types::{StructField, StructType, Type};

impl ValueDecoder {
    /// Read one type descriptor (without a `Type` value tag).
    ///
    /// A validating decoder additionally checks identifiers and field order
    /// of every struct type in the descriptor.
    pub fn read_type(&mut self) -> ValueResult<Type> {
        let t = self.read_type_within(&mut Vec::new())?;
        if self.validating {
            t.validate()?;
        }
        Ok(t)
    }

    /// Advance past one type descriptor. A validating decoder reads and
    /// checks the type instead of skipping it.
    pub fn skip_type(&mut self) -> ValueResult<()> {
        if self.validating {
            return self.read_type().map(|_| ());
        }
        self.nested(Self::skip_type_inner)
    }

    fn skip_type_inner(&mut self) -> ValueResult<()> {
        let offset = self.reader.pos();
        let kind = self.reader.read_kind()?;
        match kind {
            k if k.is_primitive() => Ok(()),
            Kind::List | Kind::Ref | Kind::Set => self.skip_type(),
            Kind::Map => {
                self.skip_type()?;
                self.skip_type()
            }
            Kind::Union => {
                let count = self.reader.read_count()?;
                for _ in 0..count {
                    self.skip_type()?;
                }
                Ok(())
            }
            Kind::Cycle => self.reader.skip_string(),
            Kind::Struct => {
                self.reader.skip_string()?;
                let count = self.reader.read_count()?;
                for _ in 0..count {
                    self.reader.skip_string()?;
                }
                for _ in 0..count {
                    self.skip_type()?;
                }
                for _ in 0..count {
                    self.reader.read_bool()?;
                }
                Ok(())
            }
            _ => Err(ValueError::UnexpectedKind { kind, offset }),
        }
    }

    fn read_type_within(&mut self, enclosing: &mut Vec<String>) -> ValueResult<Type> {
        self.nested(|dec| dec.read_type_inner(enclosing))
    }

    fn read_type_inner(&mut self, enclosing: &mut Vec<String>) -> ValueResult<Type> {
        let offset = self.reader.pos();
        let kind = self.reader.read_kind()?;
        match kind {
            k if k.is_primitive() => Ok(Type::Primitive(k)),
            Kind::List => Ok(Type::list_of(self.read_type_within(enclosing)?)),
            Kind::Ref => Ok(Type::ref_of(self.read_type_within(enclosing)?)),
            Kind::Set => Ok(Type::set_of(self.read_type_within(enclosing)?)),
            Kind::Map => {
                let key = self.read_type_within(enclosing)?;
                let value = self.read_type_within(enclosing)?;
                Ok(Type::map_of(key, value))
            }
            Kind::Union => {
                let count = self.reader.read_count()?;
                let mut members = Vec::new();
                for _ in 0..count {
                    members.push(self.read_type_within(enclosing)?);
                }
                Ok(Type::Union(members))
            }
            Kind::Cycle => {
                let name = self.reader.read_string()?;
                if name.is_empty() {
                    return Err(ValueError::AnonymousCycle { offset });
                }
                if !enclosing.iter().any(|n| *n == name) {
                    return Err(ValueError::UnresolvedCycle { name });
                }
                Ok(Type::Cycle(name))
            }
            Kind::Struct => self.read_struct_type(enclosing).map(Type::Struct),
            _ => Err(ValueError::UnexpectedKind { kind, offset }),
        }
    }

    /// Grouped layout: name, count, all field names, all field types, all
    /// optional flags.
    fn read_struct_type(&mut self, enclosing: &mut Vec<String>) -> ValueResult<StructType> {
        let name = self.reader.read_string()?;
        let count = self.reader.read_count()?;

        let mut names = Vec::new();
        for _ in 0..count {
            names.push(self.reader.read_string()?);
        }

        enclosing.push(name);
        let mut types = Vec::with_capacity(names.len());
        for _ in 0..count {
            match self.read_type_within(enclosing) {
                Ok(t) => types.push(t),
                Err(e) => {
                    enclosing.pop();
                    return Err(e);
                }
            }
        }
        let name = enclosing.pop().unwrap_or_default();

        let mut fields = Vec::with_capacity(names.len());
        for (field_name, ty) in names.into_iter().zip(types) {
            let optional = self.reader.read_bool()?;
            fields.push(StructField::new(field_name, ty, optional));
        }
        Ok(StructType::from_sorted(name, fields))
    }
}
