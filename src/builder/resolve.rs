use std::collections::{HashMap, HashSet, VecDeque};

use crate::diagnostics::UnresolvedReferenceWarning;
use crate::model::{erase_generics, simple_name, RelationKind, SymbolId, SymbolKind, SymbolRecord};

/// Resolves relationship targets against the symbols of one unit.
///
/// Type-like targets (extends, implements, throws, annotated-by) are looked
/// up by:
/// 1. exact qualified name for dotted targets (`Outer.Inner`), generic
///    arguments erased
/// 2. simple name, preferring declarations visible from the enclosing
///    scopes of the source symbol, innermost first
/// 3. simple name, first in source order
///
/// `overrides` targets are methods with the same name and parameter types
/// found by walking the owner's resolved supertypes breadth-first.
pub struct InFileResolver {
    qualified: HashMap<String, SymbolId>,
    by_simple: HashMap<String, Vec<SymbolId>>,
    parents: Vec<Option<SymbolId>>,
    kinds: Vec<SymbolKind>,
    /// Methods per owning type: name, parameter types, id.
    methods: HashMap<SymbolId, Vec<(String, Vec<String>, SymbolId)>>,
}

impl InFileResolver {
    pub fn new(records: &[SymbolRecord]) -> Self {
        let mut qualified = HashMap::new();
        let mut by_simple: HashMap<String, Vec<SymbolId>> = HashMap::new();
        let mut methods: HashMap<SymbolId, Vec<(String, Vec<String>, SymbolId)>> = HashMap::new();
        for record in records {
            if record.kind.is_type() {
                qualified
                    .entry(record.qualified_name.clone())
                    .or_insert(record.id);
                by_simple
                    .entry(record.name.clone())
                    .or_default()
                    .push(record.id);
            }
            if record.kind == SymbolKind::Method {
                if let Some(owner) = record.parent {
                    methods.entry(owner).or_default().push((
                        record.name.clone(),
                        param_types(record),
                        record.id,
                    ));
                }
            }
        }
        Self {
            qualified,
            by_simple,
            parents: records.iter().map(|r| r.parent).collect(),
            kinds: records.iter().map(|r| r.kind).collect(),
            methods,
        }
    }

    /// Resolve every edge in place. Returns a warning per edge left
    /// unresolved, in symbol order.
    pub fn resolve_all(&self, records: &mut [SymbolRecord]) -> Vec<UnresolvedReferenceWarning> {
        for record in records.iter_mut() {
            let from = record.id;
            for relation in &mut record.relations {
                if relation.kind != RelationKind::Overrides {
                    relation.resolved = self.resolve_type(&relation.target, from);
                }
            }
        }

        // Overrides need the supertype edges resolved above.
        let view: &[SymbolRecord] = records;
        let overridden: Vec<(usize, Option<SymbolId>)> = view
            .iter()
            .enumerate()
            .filter(|(_, r)| r.overrides)
            .map(|(index, r)| (index, self.resolve_override(view, r)))
            .collect();
        for (index, target) in overridden {
            for relation in &mut records[index].relations {
                if relation.kind == RelationKind::Overrides {
                    relation.resolved = target;
                }
            }
        }

        records
            .iter()
            .flat_map(|r| {
                r.relations
                    .iter()
                    .filter(|rel| !rel.is_resolved())
                    .map(move |rel| UnresolvedReferenceWarning {
                        relation: rel.kind.as_str().to_string(),
                        target: rel.target.clone(),
                        source_symbol: r.qualified_name.clone(),
                        span: r.span,
                    })
            })
            .collect()
    }

    pub fn resolve_type(&self, target: &str, from: SymbolId) -> Option<SymbolId> {
        let erased = erase_generics(target);
        if erased.contains('.') {
            if let Some(&id) = self.qualified.get(erased) {
                return Some(id);
            }
        }
        let candidates = self.by_simple.get(simple_name(target))?;
        let mut scope = Some(from);
        loop {
            if let Some(&found) = candidates
                .iter()
                .find(|c| self.parents[c.index()] == scope)
            {
                return Some(found);
            }
            match scope {
                Some(s) => scope = self.parents[s.index()],
                None => break,
            }
        }
        candidates.first().copied()
    }

    fn resolve_override(&self, records: &[SymbolRecord], method: &SymbolRecord) -> Option<SymbolId> {
        let mut owner = method.parent?;
        // Methods in an enum constant body override the enum's own.
        if self.kinds[owner.index()] == SymbolKind::EnumConstant {
            owner = self.parents[owner.index()]?;
            if let Some(found) = self.find_method(owner, method) {
                return Some(found);
            }
        }
        let params = param_types(method);
        let mut visited = HashSet::from([owner]);
        let mut queue: VecDeque<SymbolId> = supertypes(records, owner).collect();
        while let Some(ty) = queue.pop_front() {
            if !visited.insert(ty) {
                continue;
            }
            if let Some(found) = self.find_method_with(ty, &method.name, &params) {
                return Some(found);
            }
            queue.extend(supertypes(records, ty));
        }
        None
    }

    fn find_method(&self, owner: SymbolId, method: &SymbolRecord) -> Option<SymbolId> {
        self.find_method_with(owner, &method.name, &param_types(method))
    }

    fn find_method_with(&self, owner: SymbolId, name: &str, params: &[String]) -> Option<SymbolId> {
        self.methods
            .get(&owner)?
            .iter()
            .find(|(n, p, _)| n == name && p == params)
            .map(|&(_, _, id)| id)
    }
}

fn param_types(record: &SymbolRecord) -> Vec<String> {
    record
        .parameters
        .iter()
        .map(|p| p.type_name.clone())
        .collect()
}

fn supertypes(records: &[SymbolRecord], ty: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
    records[ty.index()]
        .relations
        .iter()
        .filter(|r| matches!(r.kind, RelationKind::Extends | RelationKind::Implements))
        .filter_map(|r| r.resolved)
}
