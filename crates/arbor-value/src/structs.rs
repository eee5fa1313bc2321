//! Struct values.
//!
//! A [`Struct`] is its canonical encoding plus a non-owning resolver link.
//! Field access scans the encoded fields with a private cursor per call and
//! decodes only what it returns. `set` and `delete` build a new buffer,
//! byte-copying every untouched field.

use std::cmp::Ordering;
use std::fmt;

use arbor_types::{Hash, Kind};
use bytes::Bytes;
use tracing::trace;

use crate::decoder::ValueDecoder;
use crate::error::{ValueError, ValueResult};
use crate::field_name::{verify_field_name, verify_struct_name};
use crate::reader::ValueReader;
use crate::reference::Ref;
use crate::resolver::ResolverLink;
use crate::types::{StructField, StructType, Type};
use crate::value::Value;
use crate::writer::ValueWriter;

/// An immutable struct value.
#[derive(Clone)]
pub struct Struct {
    buff: Bytes,
    name: String,
    len: usize,
    /// Offset of the first field name in `buff`.
    fields_start: usize,
    link: ResolverLink,
}

impl Struct {
    /// Build a struct from unordered `(field name, value)` pairs.
    ///
    /// Fields are sorted by name, so any permutation of the same pairs yields
    /// the same encoding. The struct resolves through the first live link
    /// among the values.
    pub fn new<S, I>(name: &str, fields: I) -> ValueResult<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Value)>,
    {
        verify_struct_name(name)?;
        let mut fields: Vec<(String, Value)> =
            fields.into_iter().map(|(n, v)| (n.into(), v)).collect();
        for (field, _) in &fields {
            verify_field_name(field)?;
        }
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(w) = fields.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ValueError::DuplicateField(w[0].0.clone()));
        }

        let link = ResolverLink::first_attached(fields.iter().map(|(_, v)| v));
        let mut w = ValueWriter::new();
        write_header(&mut w, name, fields.len());
        for (field, value) in &fields {
            w.write_string(field);
            value.write_to(&mut w);
        }
        Self::from_encoded(w.into_bytes(), link)
    }

    /// The empty anonymous struct.
    pub fn empty() -> Self {
        let mut w = ValueWriter::new();
        write_header(&mut w, "", 0);
        let buff = w.into_bytes();
        Self {
            fields_start: buff.len(),
            buff,
            name: String::new(),
            len: 0,
            link: ResolverLink::detached(),
        }
    }

    /// Wrap an encoded struct (tag included). Only the header is read; field
    /// bytes are trusted to be well-formed and name-sorted.
    pub fn from_encoded(buff: Bytes, link: ResolverLink) -> ValueResult<Self> {
        let mut reader = ValueReader::new(buff.clone());
        let kind = reader.read_kind()?;
        if kind != Kind::Struct {
            return Err(ValueError::UnexpectedValueKind {
                expected: Kind::Struct,
                actual: kind,
            });
        }
        let name = reader.read_string()?;
        let offset = reader.pos();
        let len = usize::try_from(reader.read_count()?)
            .map_err(|_| ValueError::VarintOverflow { offset })?;
        Ok(Self {
            buff,
            name,
            len,
            fields_start: reader.pos(),
            link,
        })
    }

    /// The same struct, resolving nested refs through `link`.
    pub fn with_resolver(mut self, link: ResolverLink) -> Self {
        self.link = link;
        self
    }

    pub fn resolver(&self) -> &ResolverLink {
        &self.link
    }

    /// The canonical encoding, tag included.
    pub fn encoded(&self) -> &Bytes {
        &self.buff
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of fields. Reads no field data.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn cursor(&self) -> ValueDecoder {
        let mut dec = ValueDecoder::new(self.buff.clone(), self.link.clone());
        dec.set_pos(self.fields_start);
        dec
    }

    /// Iterate `(name, value)` pairs in ascending name order.
    pub fn fields(&self) -> FieldIter {
        FieldIter {
            dec: self.cursor(),
            remaining: self.len,
        }
    }

    /// Visit every field in ascending name order.
    pub fn iter_fields(&self, mut cb: impl FnMut(&str, &Value)) -> ValueResult<()> {
        for field in self.fields() {
            let (name, value) = field?;
            cb(&name, &value);
        }
        Ok(())
    }

    /// Position a cursor at the value of field `name`, or `None` if absent.
    /// Stops as soon as the scan passes `name` alphabetically.
    fn seek(&self, name: &str) -> ValueResult<Option<ValueDecoder>> {
        let mut dec = self.cursor();
        for _ in 0..self.len {
            let field = dec.reader_mut().read_string()?;
            match field.as_str().cmp(name) {
                Ordering::Equal => return Ok(Some(dec)),
                Ordering::Greater => return Ok(None),
                Ordering::Less => dec.skip_value()?,
            }
        }
        Ok(None)
    }

    pub fn maybe_get(&self, name: &str) -> ValueResult<Option<Value>> {
        match self.seek(name)? {
            Some(mut dec) => dec.read_value().map(Some),
            None => Ok(None),
        }
    }

    /// Like [`maybe_get`](Self::maybe_get), but an absent field is an error.
    pub fn get(&self, name: &str) -> ValueResult<Value> {
        self.maybe_get(name)?
            .ok_or_else(|| ValueError::MissingField(name.to_string()))
    }

    pub fn has(&self, name: &str) -> ValueResult<bool> {
        Ok(self.seek(name)?.is_some())
    }

    /// A new struct with field `name` set to `value`, replacing any existing
    /// value or inserting the field at its sorted position. A detached
    /// struct adopts the link of `value`.
    pub fn set(&self, name: &str, value: Value) -> ValueResult<Self> {
        verify_field_name(name)?;
        let replacing = self.has(name)?;
        let count = if replacing { self.len } else { self.len + 1 };

        let mut w = ValueWriter::with_capacity(self.buff.len());
        write_header(&mut w, &self.name, count);
        let mut dec = self.cursor();
        let mut written = false;
        for _ in 0..self.len {
            let field = dec.reader_mut().read_string()?;
            if !written && field.as_str() >= name {
                w.write_string(name);
                value.write_to(&mut w);
                written = true;
                if field == name {
                    dec.skip_value()?;
                    continue;
                }
            }
            w.write_string(&field);
            dec.copy_value(&mut w)?;
        }
        if !written {
            w.write_string(name);
            value.write_to(&mut w);
        }

        let link = if self.link.is_attached() {
            self.link.clone()
        } else {
            value.link().unwrap_or(&self.link).clone()
        };
        trace!(name = %self.name, field = name, replacing, "struct field set");
        Self::from_encoded(w.into_bytes(), link)
    }

    /// A new struct without field `name`. An absent field is not an error;
    /// the result is then identical to `self`.
    pub fn delete(&self, name: &str) -> ValueResult<Self> {
        if !self.has(name)? {
            return Ok(self.clone());
        }

        let mut w = ValueWriter::with_capacity(self.buff.len());
        write_header(&mut w, &self.name, self.len - 1);
        let mut dec = self.cursor();
        for _ in 0..self.len {
            let field = dec.reader_mut().read_string()?;
            if field == name {
                dec.skip_value()?;
                continue;
            }
            w.write_string(&field);
            dec.copy_value(&mut w)?;
        }

        trace!(name = %self.name, field = name, "struct field deleted");
        Self::from_encoded(w.into_bytes(), self.link.clone())
    }

    /// Visit each field value.
    pub fn walk_values(&self, cb: &mut dyn FnMut(&Value)) -> ValueResult<()> {
        self.iter_fields(|_, v| cb(v))
    }

    /// Visit every ref reachable inside the fields, at any depth.
    pub fn walk_refs(&self, cb: &mut dyn FnMut(&Ref)) -> ValueResult<()> {
        ValueDecoder::new(self.buff.clone(), ResolverLink::detached()).walk_refs(cb)
    }

    /// Derive the struct type from the field values. Derived fields are
    /// never optional. A nested struct with this struct's name becomes a
    /// [`Type::Cycle`] back to it.
    pub fn type_of(&self) -> ValueResult<Type> {
        let mut fields = Vec::with_capacity(self.len);
        for field in self.fields() {
            let (name, value) = field?;
            let ty = value.type_of()?.fold_cycles(&self.name);
            fields.push(StructField::new(name, ty, false));
        }
        Ok(Type::Struct(StructType::from_sorted(
            self.name.clone(),
            fields,
        )))
    }

    /// Digest of the encoding. Not cached.
    pub fn hash(&self) -> Hash {
        Hash::of(&self.buff)
    }

    pub fn equals(&self, other: &Struct) -> bool {
        self.buff == other.buff
    }
}

fn write_header(w: &mut ValueWriter, name: &str, count: usize) {
    w.write_kind(Kind::Struct);
    w.write_string(name);
    w.write_count(count as u64);
}

impl PartialEq for Struct {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Struct {}

impl fmt::Debug for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Struct")
            .field("name", &self.name)
            .field("len", &self.len)
            .field("hash", &self.hash())
            .finish()
    }
}

/// Iterator over a struct's fields in ascending name order.
///
/// Yields an error at most once; iteration ends after it.
#[derive(Debug)]
pub struct FieldIter {
    dec: ValueDecoder,
    remaining: usize,
}

impl Iterator for FieldIter {
    type Item = ValueResult<(String, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let field = self
            .dec
            .reader_mut()
            .read_string()
            .and_then(|name| Ok((name, self.dec.read_value()?)));
        if field.is_err() {
            self.remaining = 0;
        }
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// A pre-validated struct shape for building many structs with the same
/// name and fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructTemplate {
    name: String,
    field_names: Vec<String>,
}

impl StructTemplate {
    /// Validate `name` and `field_names` once. Field names must be strictly
    /// ascending.
    pub fn new<S: Into<String>>(
        name: &str,
        field_names: impl IntoIterator<Item = S>,
    ) -> ValueResult<Self> {
        verify_struct_name(name)?;
        let field_names: Vec<String> = field_names.into_iter().map(Into::into).collect();
        for (i, field) in field_names.iter().enumerate() {
            verify_field_name(field)?;
            if i == 0 {
                continue;
            }
            let previous = &field_names[i - 1];
            match previous.cmp(field) {
                Ordering::Less => {}
                Ordering::Equal => return Err(ValueError::DuplicateField(field.clone())),
                Ordering::Greater => {
                    return Err(ValueError::UnsortedFields {
                        previous: previous.clone(),
                        next: field.clone(),
                    })
                }
            }
        }
        Ok(Self {
            name: name.to_string(),
            field_names,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Build a struct from values given in field-name order.
    pub fn new_struct(&self, values: Vec<Value>) -> ValueResult<Struct> {
        if values.len() != self.field_names.len() {
            return Err(ValueError::TemplateArity {
                expected: self.field_names.len(),
                actual: values.len(),
            });
        }
        let mut w = ValueWriter::new();
        write_header(&mut w, &self.name, values.len());
        for (field, value) in self.field_names.iter().zip(&values) {
            w.write_string(field);
            value.write_to(&mut w);
        }
        Struct::from_encoded(w.into_bytes(), ResolverLink::first_attached(&values))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    fn point(x: f64, y: f64) -> Struct {
        Struct::new("Point", [("x", Value::Number(x)), ("y", Value::Number(y))]).unwrap()
    }

    fn field_names(s: &Struct) -> Vec<String> {
        s.fields().map(|f| f.unwrap().0).collect()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn point_encodes_fields_in_order() {
        let p = Struct::new("Point", [("y", Value::Number(2.0)), ("x", Value::Number(1.0))]).unwrap();
        assert_eq!(p.name(), "Point");
        assert_eq!(p.len(), 2);
        assert_eq!(field_names(&p), ["x", "y"]);
        assert_eq!(p, point(1.0, 2.0));
    }

    #[test]
    fn point_set_matches_direct_construction() {
        let p = point(1.0, 2.0).set("y", Value::Number(5.0)).unwrap();
        assert_eq!(p, point(1.0, 5.0));
        assert_eq!(p.encoded(), point(1.0, 5.0).encoded());
    }

    #[test]
    fn rejects_invalid_names() {
        assert!(matches!(
            Struct::new("Bad Name", Vec::<(String, Value)>::new()),
            Err(ValueError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            Struct::new("S", [("1x", Value::Bool(true))]),
            Err(ValueError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            Struct::new("S", [("a", Value::Bool(true)), ("a", Value::Bool(false))]),
            Err(ValueError::DuplicateField(n)) if n == "a"
        ));
        assert!(matches!(
            point(0.0, 0.0).set("no good", Value::Bool(true)),
            Err(ValueError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn empty_struct() {
        let e = Struct::empty();
        assert!(e.is_empty());
        assert_eq!(e.name(), "");
        assert_eq!(e, Struct::new("", Vec::<(String, Value)>::new()).unwrap());
        assert_eq!(e.fields().count(), 0);
    }

    #[test]
    fn decoded_struct_reads_back_fields() {
        let s = Struct::new(
            "Rec",
            [
                ("name", Value::from("ada")),
                ("age", Value::Number(36.0)),
                ("tags", Value::List(crate::collections::List::new(vec![Value::from("x")]))),
            ],
        )
        .unwrap();
        let decoded = ValueDecoder::new(s.encoded().clone(), ResolverLink::detached())
            .read_struct()
            .unwrap();
        let fields: Vec<(String, Value)> = decoded.fields().map(Result::unwrap).collect();
        let expected: Vec<(String, Value)> = s.fields().map(Result::unwrap).collect();
        assert_eq!(fields, expected);
        assert_eq!(field_names(&decoded), ["age", "name", "tags"]);
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    #[test]
    fn get_and_maybe_get() {
        let p = point(1.0, 2.0);
        assert_eq!(p.get("x").unwrap(), Value::Number(1.0));
        assert_eq!(p.maybe_get("y").unwrap(), Some(Value::Number(2.0)));
        assert_eq!(p.maybe_get("a").unwrap(), None);
        assert_eq!(p.maybe_get("z").unwrap(), None);
        assert!(matches!(p.get("z"), Err(ValueError::MissingField(n)) if n == "z"));
    }

    #[test]
    fn iter_fields_visits_in_order() {
        let mut seen = Vec::new();
        point(3.0, 4.0)
            .iter_fields(|n, v| seen.push((n.to_string(), v.clone())))
            .unwrap();
        assert_eq!(
            seen,
            vec![
                ("x".to_string(), Value::Number(3.0)),
                ("y".to_string(), Value::Number(4.0))
            ]
        );
    }

    #[test]
    fn set_inserts_at_sorted_position() {
        let p = point(1.0, 2.0);
        let front = p.set("a", Value::Bool(true)).unwrap();
        assert_eq!(field_names(&front), ["a", "x", "y"]);
        let middle = p.set("xx", Value::Bool(true)).unwrap();
        assert_eq!(field_names(&middle), ["x", "xx", "y"]);
        let back = p.set("z", Value::Bool(true)).unwrap();
        assert_eq!(field_names(&back), ["x", "y", "z"]);
        assert_eq!(back.len(), 3);
        // the source struct is untouched
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn delete_removes_or_returns_unchanged() {
        let p = point(1.0, 2.0);
        let d = p.delete("x").unwrap();
        assert_eq!(field_names(&d), ["y"]);
        assert_eq!(d.name(), "Point");
        let same = p.delete("nope").unwrap();
        assert_eq!(same.encoded(), p.encoded());
    }

    #[test]
    fn type_of_and_hash() {
        let p = point(1.0, 2.0);
        let t = p.type_of().unwrap();
        let st = t.as_struct().unwrap();
        assert_eq!(st.name(), "Point");
        assert!(st.fields().iter().all(|f| !f.optional && f.ty == Type::number()));
        assert_eq!(p.hash(), Hash::of(p.encoded()));
        assert_ne!(p.hash(), point(1.0, 3.0).hash());
    }

    fn node(label: &str, children: Vec<Struct>) -> Struct {
        let children = children.into_iter().map(Value::Struct).collect();
        Struct::new(
            "Node",
            [
                ("children", Value::List(crate::collections::List::new(children))),
                ("label", Value::from(label)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn self_referential_instances_derive_a_cycle() {
        let two_level = node("root", vec![node("leaf", vec![])]);
        let expected = Type::struct_of(
            "Node",
            vec![
                StructField::new("children", Type::list_of(Type::Cycle("Node".into())), false),
                StructField::new("label", Type::string(), false),
            ],
        )
        .unwrap();
        let derived = two_level.type_of().unwrap();
        assert_eq!(derived, expected);
        derived.validate().unwrap();

        let three_level = node("top", vec![two_level.clone(), node("leaf", vec![])]);
        assert_eq!(three_level.type_of().unwrap(), expected);
        let shallow = Ref::from_value(&Value::Struct(two_level)).unwrap();
        let deep = Ref::from_value(&Value::Struct(three_level)).unwrap();
        assert_eq!(shallow.target_type(), deep.target_type());
    }

    #[test]
    fn walk_values_visits_immediate_fields() {
        let inner = point(1.0, 2.0);
        let outer = Struct::new("Outer", [("p", Value::Struct(inner.clone()))]).unwrap();
        let mut seen = Vec::new();
        outer.walk_values(&mut |v| seen.push(v.clone())).unwrap();
        assert_eq!(seen, vec![Value::Struct(inner)]);
    }

    #[test]
    fn corrupt_field_ends_iteration_with_one_error() {
        let p = point(1.0, 2.0);
        let cut = p.encoded().slice(0..p.encoded().len() - 3);
        let s = Struct::from_encoded(cut, ResolverLink::detached()).unwrap();
        let items: Vec<_> = s.fields().collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ValueError::Truncated { .. })));
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    #[test]
    fn template_builds_same_bytes_as_new() {
        let t = StructTemplate::new("Point", ["x", "y"]).unwrap();
        let s = t
            .new_struct(vec![Value::Number(1.0), Value::Number(2.0)])
            .unwrap();
        assert_eq!(s, point(1.0, 2.0));
    }

    #[test]
    fn template_validates_shape() {
        assert!(matches!(
            StructTemplate::new("P", ["y", "x"]),
            Err(ValueError::UnsortedFields { .. })
        ));
        assert!(matches!(
            StructTemplate::new("P", ["x", "x"]),
            Err(ValueError::DuplicateField(_))
        ));
        assert!(matches!(
            StructTemplate::new("P", ["x", "bad name"]),
            Err(ValueError::InvalidIdentifier { .. })
        ));
        let t = StructTemplate::new("P", ["x"]).unwrap();
        assert!(matches!(
            t.new_struct(vec![]),
            Err(ValueError::TemplateArity { expected: 1, actual: 0 })
        ));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    fn field_map() -> impl Strategy<Value = BTreeMap<String, i32>> {
        prop::collection::btree_map("[a-z][a-z0-9_]{0,5}", any::<i32>(), 0..8)
    }

    fn build(fields: &BTreeMap<String, i32>, reverse: bool) -> Struct {
        let mut pairs: Vec<(String, Value)> = fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::Number(f64::from(*v))))
            .collect();
        if reverse {
            pairs.reverse();
        }
        Struct::new("S", pairs).unwrap()
    }

    proptest! {
        #[test]
        fn construction_order_does_not_matter(fields in field_map()) {
            let forward = build(&fields, false);
            let backward = build(&fields, true);
            prop_assert_eq!(forward.encoded(), backward.encoded());
        }

        #[test]
        fn set_then_get(fields in field_map(), name in "[a-z][a-z0-9_]{0,5}", n in any::<i32>()) {
            let s = build(&fields, false);
            let v = Value::Number(f64::from(n));
            let t = s.set(&name, v.clone()).unwrap();
            prop_assert_eq!(t.get(&name).unwrap(), v.clone());
            let expected_len = s.len() + usize::from(!fields.contains_key(&name));
            prop_assert_eq!(t.len(), expected_len);
            prop_assert_eq!(t.maybe_get(&name).unwrap(), Some(v));
        }

        #[test]
        fn set_then_delete_restores_absent_field(fields in field_map(), name in "[a-z][a-z0-9_]{0,5}") {
            prop_assume!(!fields.contains_key(&name));
            let s = build(&fields, false);
            let back = s.set(&name, Value::Bool(true)).unwrap().delete(&name).unwrap();
            prop_assert!(back.equals(&s));
        }

        #[test]
        fn set_then_delete_present_field(fields in field_map(), n in any::<i32>()) {
            prop_assume!(!fields.is_empty());
            let s = build(&fields, false);
            let name = fields.keys().next().unwrap().clone();
            let got = s.set(&name, Value::Number(f64::from(n))).unwrap().delete(&name).unwrap();
            let mut rest = fields.clone();
            rest.remove(&name);
            prop_assert!(got.equals(&build(&rest, false)));
        }

        #[test]
        fn delete_absent_is_identity(fields in field_map(), name in "[a-z][a-z0-9_]{0,5}") {
            prop_assume!(!fields.contains_key(&name));
            let s = build(&fields, false);
            let deleted = s.delete(&name).unwrap();
            prop_assert_eq!(deleted.encoded(), s.encoded());
        }
    }
}
