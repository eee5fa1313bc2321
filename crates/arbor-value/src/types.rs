//! Structural type descriptors.
//!
//! A [`Type`] is a plain tree. Self-referential struct types are expressed
//! with [`Type::Cycle`], a back-edge naming an enclosing [`StructType`]; it is
//! resolved by walking the chain of enclosing structs rather than through
//! shared pointers, so the graph never owns itself.

use arbor_types::Kind;

use crate::error::{ValueError, ValueResult};
use crate::field_name::{verify_field_name, verify_struct_name};
use crate::writer::ValueWriter;

/// A structural type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// Bool, Number, String, Blob, Value, or Type.
    Primitive(Kind),
    List(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Ref(Box<Type>),
    Set(Box<Type>),
    Struct(StructType),
    /// Ordered alternatives.
    Union(Vec<Type>),
    /// Back-reference to the nearest enclosing struct type with this name.
    Cycle(String),
}

/// A named struct type with fields in ascending name order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructType {
    name: String,
    fields: Vec<StructField>,
}

/// One field of a [`StructType`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub optional: bool,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: Type, optional: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            optional,
        }
    }
}

impl StructType {
    /// Build a struct type, sorting fields by name.
    ///
    /// The struct name must be empty or a valid identifier; field names must
    /// be valid and unique.
    pub fn new(name: impl Into<String>, mut fields: Vec<StructField>) -> ValueResult<Self> {
        let name = name.into();
        verify_struct_name(&name)?;
        for f in &fields {
            verify_field_name(&f.name)?;
        }
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(w) = fields.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(ValueError::DuplicateField(w[0].name.clone()));
        }
        Ok(Self { name, fields })
    }

    /// Assemble from fields that are already known to be in order, as the
    /// decoder and type derivation produce them.
    pub(crate) fn from_sorted(name: String, fields: Vec<StructField>) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields
            .binary_search_by(|f| f.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.fields[i])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Type {
    pub fn bool() -> Self {
        Self::Primitive(Kind::Bool)
    }

    pub fn number() -> Self {
        Self::Primitive(Kind::Number)
    }

    pub fn string() -> Self {
        Self::Primitive(Kind::String)
    }

    pub fn blob() -> Self {
        Self::Primitive(Kind::Blob)
    }

    /// The abstract "any value" type.
    pub fn value() -> Self {
        Self::Primitive(Kind::Value)
    }

    /// The type of type values.
    pub fn type_type() -> Self {
        Self::Primitive(Kind::Type)
    }

    pub fn list_of(elem: Type) -> Self {
        Self::List(Box::new(elem))
    }

    pub fn map_of(key: Type, value: Type) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    pub fn ref_of(target: Type) -> Self {
        Self::Ref(Box::new(target))
    }

    pub fn set_of(elem: Type) -> Self {
        Self::Set(Box::new(elem))
    }

    pub fn struct_of(name: impl Into<String>, fields: Vec<StructField>) -> ValueResult<Self> {
        StructType::new(name, fields).map(Self::Struct)
    }

    /// Union of `types`, simplified: nested unions are flattened, duplicates
    /// dropped (first occurrence wins), and a single alternative collapses to
    /// itself.
    pub fn union_of(types: Vec<Type>) -> Self {
        let flat = types.into_iter().flat_map(|t| match t {
            Type::Union(inner) => inner,
            other => vec![other],
        });
        let mut members: Vec<Type> = Vec::new();
        for t in flat {
            if !members.contains(&t) {
                members.push(t);
            }
        }
        if members.len() == 1 {
            return members.remove(0);
        }
        Self::Union(members)
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Primitive(k) => *k,
            Self::List(_) => Kind::List,
            Self::Map(..) => Kind::Map,
            Self::Ref(_) => Kind::Ref,
            Self::Set(_) => Kind::Set,
            Self::Struct(_) => Kind::Struct,
            Self::Union(_) => Kind::Union,
            Self::Cycle(_) => Kind::Cycle,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Self::Struct(st) => Some(st),
            _ => None,
        }
    }

    /// Follow a cycle back-reference to the struct it names, searching the
    /// innermost enclosing struct first. Returns `None` for non-cycle types
    /// and for cycles with no matching enclosing struct.
    pub fn resolve_cycle<'a>(&self, enclosing: &[&'a StructType]) -> Option<&'a StructType> {
        match self {
            Self::Cycle(name) if !name.is_empty() => {
                enclosing.iter().rev().find(|st| st.name == *name).copied()
            }
            _ => None,
        }
    }

    /// Replace every nested struct type named `name` with a cycle back to
    /// it. Unions are re-simplified afterwards, since folding can make
    /// alternatives equal. An empty `name` folds nothing.
    pub(crate) fn fold_cycles(self, name: &str) -> Type {
        if name.is_empty() {
            return self;
        }
        match self {
            Self::Struct(st) if st.name == name => Self::Cycle(st.name),
            Self::Struct(st) => Self::Struct(StructType {
                name: st.name,
                fields: st
                    .fields
                    .into_iter()
                    .map(|f| StructField::new(f.name, f.ty.fold_cycles(name), f.optional))
                    .collect(),
            }),
            Self::List(t) => Self::list_of(t.fold_cycles(name)),
            Self::Ref(t) => Self::ref_of(t.fold_cycles(name)),
            Self::Set(t) => Self::set_of(t.fold_cycles(name)),
            Self::Map(k, v) => Self::map_of(k.fold_cycles(name), v.fold_cycles(name)),
            Self::Union(ts) => Self::union_of(ts.into_iter().map(|t| t.fold_cycles(name)).collect()),
            other => other,
        }
    }

    /// Check the whole type graph: identifiers, field order, and that every
    /// cycle names an enclosing, non-anonymous struct.
    pub fn validate(&self) -> ValueResult<()> {
        self.validate_within(&mut Vec::new())
    }

    fn validate_within<'a>(&'a self, enclosing: &mut Vec<&'a StructType>) -> ValueResult<()> {
        match self {
            Self::Primitive(k) if k.is_primitive() => Ok(()),
            Self::Primitive(k) => Err(ValueError::InvalidType(format!(
                "{k} is not a primitive kind"
            ))),
            Self::List(t) | Self::Ref(t) | Self::Set(t) => t.validate_within(enclosing),
            Self::Map(k, v) => {
                k.validate_within(enclosing)?;
                v.validate_within(enclosing)
            }
            Self::Union(ts) => ts.iter().try_for_each(|t| t.validate_within(enclosing)),
            Self::Cycle(name) => {
                if name.is_empty() {
                    return Err(ValueError::InvalidType(
                        "cycle to an anonymous struct".into(),
                    ));
                }
                match self.resolve_cycle(enclosing) {
                    Some(_) => Ok(()),
                    None => Err(ValueError::UnresolvedCycle { name: name.clone() }),
                }
            }
            Self::Struct(st) => {
                verify_struct_name(&st.name)?;
                for (i, f) in st.fields.iter().enumerate() {
                    verify_field_name(&f.name)?;
                    if i > 0 && st.fields[i - 1].name >= f.name {
                        return Err(ValueError::UnsortedFields {
                            previous: st.fields[i - 1].name.clone(),
                            next: f.name.clone(),
                        });
                    }
                }
                enclosing.push(st);
                let result = st
                    .fields
                    .iter()
                    .try_for_each(|f| f.ty.validate_within(enclosing));
                enclosing.pop();
                result
            }
        }
    }

    /// Write the type descriptor (no `Type` value tag).
    ///
    /// Struct types are written as name, field count, then all field names,
    /// all field types, and all optional flags.
    pub fn write_to(&self, w: &mut ValueWriter) {
        w.write_kind(self.kind());
        match self {
            Self::Primitive(_) => {}
            Self::List(t) | Self::Ref(t) | Self::Set(t) => t.write_to(w),
            Self::Map(k, v) => {
                k.write_to(w);
                v.write_to(w);
            }
            Self::Union(ts) => {
                w.write_count(ts.len() as u64);
                for t in ts {
                    t.write_to(w);
                }
            }
            Self::Cycle(name) => w.write_string(name),
            Self::Struct(st) => {
                w.write_string(&st.name);
                w.write_count(st.fields.len() as u64);
                for f in &st.fields {
                    w.write_string(&f.name);
                }
                for f in &st.fields {
                    f.ty.write_to(w);
                }
                for f in &st.fields {
                    w.write_bool(f.optional);
                }
            }
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive(k) => write!(f, "{k}"),
            Self::List(t) => write!(f, "List<{t}>"),
            Self::Map(k, v) => write!(f, "Map<{k}, {v}>"),
            Self::Ref(t) => write!(f, "Ref<{t}>"),
            Self::Set(t) => write!(f, "Set<{t}>"),
            Self::Union(ts) => {
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{t}")?;
                }
                Ok(())
            }
            Self::Cycle(name) => write!(f, "Cycle<{name}>"),
            Self::Struct(st) => {
                write!(f, "struct {} {{", st.name)?;
                for (i, field) in st.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    let opt = if field.optional { "?" } else { "" };
                    write!(f, " {}{opt}: {}", field.name, field.ty)?;
                }
                f.write_str(" }")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_type() -> Type {
        Type::struct_of(
            "Node",
            vec![
                StructField::new("value", Type::number(), false),
                StructField::new("children", Type::list_of(Type::Cycle("Node".into())), false),
            ],
        )
        .unwrap()
    }

    #[test]
    fn struct_type_sorts_fields() {
        let t = node_type();
        let st = t.as_struct().unwrap();
        let names: Vec<&str> = st.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["children", "value"]);
        assert!(st.field("value").is_some());
        assert!(st.field("missing").is_none());
    }

    #[test]
    fn struct_type_rejects_duplicates_and_bad_names() {
        let dup = StructType::new(
            "S",
            vec![
                StructField::new("a", Type::bool(), false),
                StructField::new("a", Type::number(), false),
            ],
        );
        assert!(matches!(dup, Err(ValueError::DuplicateField(n)) if n == "a"));

        let bad = StructType::new("1S", vec![]);
        assert!(matches!(bad, Err(ValueError::InvalidIdentifier { .. })));
    }

    #[test]
    fn self_referential_type_validates() {
        node_type().validate().unwrap();
    }

    #[test]
    fn cycle_resolves_to_enclosing_struct() {
        let t = node_type();
        let st = t.as_struct().unwrap();
        let children = &st.field("children").unwrap().ty;
        let Type::List(elem) = children else {
            panic!("expected list");
        };
        let target = elem.resolve_cycle(&[st]).unwrap();
        assert_eq!(target.name(), "Node");
    }

    #[test]
    fn dangling_cycle_fails_validation() {
        let t = Type::list_of(Type::Cycle("Nowhere".into()));
        assert!(matches!(
            t.validate(),
            Err(ValueError::UnresolvedCycle { name }) if name == "Nowhere"
        ));
    }

    #[test]
    fn anonymous_cycle_fails_validation() {
        let t = Type::struct_of(
            "",
            vec![StructField::new("me", Type::Cycle(String::new()), false)],
        )
        .unwrap();
        assert!(matches!(t.validate(), Err(ValueError::InvalidType(_))));
    }

    #[test]
    fn fold_cycles_replaces_same_named_structs() {
        let shallow = Type::struct_of("Node", vec![]).unwrap();
        let deep = Type::struct_of(
            "Node",
            vec![StructField::new("x", Type::number(), false)],
        )
        .unwrap();
        let other = Type::struct_of(
            "Other",
            vec![StructField::new("up", shallow.clone(), false)],
        )
        .unwrap();
        let t = Type::list_of(Type::Union(vec![shallow.clone(), deep, other]));
        let folded = t.fold_cycles("Node");
        let expected_other = Type::struct_of(
            "Other",
            vec![StructField::new("up", Type::Cycle("Node".into()), false)],
        )
        .unwrap();
        assert_eq!(
            folded,
            Type::list_of(Type::Union(vec![Type::Cycle("Node".into()), expected_other]))
        );
        assert_eq!(shallow.clone().fold_cycles(""), shallow);
    }

    #[test]
    fn union_of_simplifies() {
        assert_eq!(Type::union_of(vec![Type::number()]), Type::number());
        let u = Type::union_of(vec![
            Type::number(),
            Type::union_of(vec![Type::string(), Type::number()]),
            Type::string(),
        ]);
        assert_eq!(u, Type::Union(vec![Type::number(), Type::string()]));
        assert_eq!(Type::union_of(vec![]), Type::Union(vec![]));
    }

    #[test]
    fn struct_encoding_groups_names_types_flags() {
        let t = Type::struct_of(
            "P",
            vec![
                StructField::new("x", Type::number(), false),
                StructField::new("y", Type::bool(), true),
            ],
        )
        .unwrap();
        let mut w = ValueWriter::new();
        t.write_to(&mut w);
        let expected = [
            Kind::Struct.tag(),
            1,
            b'P',
            2,
            1,
            b'x',
            1,
            b'y',
            Kind::Number.tag(),
            Kind::Bool.tag(),
            0,
            1,
        ];
        assert_eq!(w.into_bytes().as_ref(), &expected);
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(
            Type::map_of(Type::string(), Type::list_of(Type::number())).to_string(),
            "Map<String, List<Number>>"
        );
    }
}
