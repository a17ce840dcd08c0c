//! Architecture alignment: core kinds, strict shapes, noise suppression
//!
//! | Kind   | Shape                                   |
//! |--------|-----------------------------------------|
//! | Import | File → File                             |
//! | Extend | Class → Class                           |
//! | Create | Method/Function → Class                 |
//! | Call   | Method/Function → Method/Function       |
//! | Use    | Method/Function → Field of an enclosing class |

use crate::scope::FocusScope;
use archdsm_core::{Dep, DepKind, Entity, EntityKind, FactGraph, FileIndex};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Why the aligned view rejected a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    NonCoreKind,
    UnknownEntity,
    PackageInitializer,
    NestedHelper,
    /// Method/Function → Class edge other than Create
    TypeCoupling,
    FieldToMethod,
    /// Class → Class Use already expressed by an Extend edge
    RedundantClassUse,
    /// Call to a constructor hook from outside a constructor
    ConstructorCall,
    ShapeMismatch,
    /// Use of a field whose class does not enclose the source
    ForeignFieldUse,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::NonCoreKind => "non_core_kind",
            DropReason::UnknownEntity => "unknown_entity",
            DropReason::PackageInitializer => "package_initializer",
            DropReason::NestedHelper => "nested_helper",
            DropReason::TypeCoupling => "type_coupling",
            DropReason::FieldToMethod => "field_to_method",
            DropReason::RedundantClassUse => "redundant_class_use",
            DropReason::ConstructorCall => "constructor_call",
            DropReason::ShapeMismatch => "shape_mismatch",
            DropReason::ForeignFieldUse => "foreign_field_use",
        };
        f.write_str(s)
    }
}

/// Whether `(src, tgt)` is the required shape for `kind`.
pub fn shape_allowed(kind: &DepKind, src: &EntityKind, tgt: &EntityKind) -> bool {
    match kind {
        DepKind::Import => *src == EntityKind::File && *tgt == EntityKind::File,
        DepKind::Extend => *src == EntityKind::Class && *tgt == EntityKind::Class,
        DepKind::Create => src.is_callable() && *tgt == EntityKind::Class,
        DepKind::Call => src.is_callable() && tgt.is_callable(),
        DepKind::Use => src.is_callable() && *tgt == EntityKind::Field,
        DepKind::Other(_) => false,
    }
}

pub struct AlignmentFilter<'a> {
    graph: &'a FactGraph,
    files: &'a FileIndex,
    scope: &'a FocusScope,
}

impl<'a> AlignmentFilter<'a> {
    pub fn new(graph: &'a FactGraph, files: &'a FileIndex, scope: &'a FocusScope) -> Self {
        Self { graph, files, scope }
    }

    /// Accept or reject one raw dependency. Noise rules run before the shape
    /// table so the reason names the specific pattern.
    pub fn check(&self, dep: &Dep) -> Result<(), DropReason> {
        if !dep.kind.is_core() {
            return Err(DropReason::NonCoreKind);
        }
        let (Some(src), Some(tgt)) = (self.graph.entity(&dep.src), self.graph.entity(&dep.tgt)) else {
            return Err(DropReason::UnknownEntity);
        };
        if self.in_package_initializer(src) || self.in_package_initializer(tgt) {
            return Err(DropReason::PackageInitializer);
        }
        if self.graph.is_nested_helper(&src.id) || self.graph.is_nested_helper(&tgt.id) {
            return Err(DropReason::NestedHelper);
        }

        if src.kind.is_callable() && tgt.kind == EntityKind::Class && dep.kind != DepKind::Create {
            return Err(DropReason::TypeCoupling);
        }
        if src.kind == EntityKind::Field && tgt.kind == EntityKind::Method {
            return Err(DropReason::FieldToMethod);
        }
        if src.kind == EntityKind::Class
            && tgt.kind == EntityKind::Class
            && dep.kind == DepKind::Use
            && self.graph.has_dep_between(&src.id, &tgt.id, &DepKind::Extend)
        {
            return Err(DropReason::RedundantClassUse);
        }
        if dep.kind == DepKind::Call && tgt.is_constructor() && !src.is_constructor() {
            return Err(DropReason::ConstructorCall);
        }

        if !shape_allowed(&dep.kind, &src.kind, &tgt.kind) {
            return Err(DropReason::ShapeMismatch);
        }
        if dep.kind == DepKind::Use && !self.uses_own_field(src, tgt) {
            return Err(DropReason::ForeignFieldUse);
        }
        Ok(())
    }

    fn in_package_initializer(&self, entity: &Entity) -> bool {
        self.files
            .file_name(&entity.id)
            .is_some_and(|name| self.scope.is_package_initializer(name))
    }

    // The field's owning class must enclose the source.
    fn uses_own_field(&self, src: &Entity, field: &Entity) -> bool {
        let Some(owner) = self.graph.owner_class(&field.id) else {
            return false;
        };
        self.graph.ancestors(&src.id).iter().any(|a| a.id == owner.id)
    }
}

/// Kept count and drop counts by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignmentReport {
    pub kept: usize,
    pub dropped: BTreeMap<DropReason, usize>,
}

impl AlignmentReport {
    pub fn record(&mut self, outcome: Result<(), DropReason>) {
        match outcome {
            Ok(()) => self.kept += 1,
            Err(reason) => *self.dropped.entry(reason).or_insert(0) += 1,
        }
    }
}
