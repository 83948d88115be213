//! Class synthesis from reflected class generators
//!
//! Synthesis is a pure builder: it turns a [`ClassDescriptor`] into a new
//! proxy class and leaves cache placement to the caller.

use indexmap::IndexMap;

use crate::class::ClassRef;
use crate::descriptor::ClassDescriptor;
use crate::error::{BindError, BindResult};
use crate::protocol::ClassDef;
use crate::table::AttrKind;

/// Builds proxy classes from descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct Synthesizer {
    strict_member_partition: bool,
}

impl Synthesizer {
    /// Synthesizer with the field-wins tie-break
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject names that are both public fields and public methods instead of
    /// letting the field win
    pub fn strict_member_partition(mut self, strict: bool) -> Self {
        self.strict_member_partition = strict;
        self
    }

    /// Default-attribute entries for a class synthesized from `descriptor`.
    ///
    /// Later steps override earlier ones: the base's table, then every public
    /// method as `PlainForward`, then every public field as `PropertyForward`.
    pub fn attribute_entries(
        &self,
        descriptor: &ClassDescriptor,
        base: &ClassRef,
    ) -> BindResult<Vec<(String, AttrKind)>> {
        if self.strict_member_partition {
            let names = descriptor.overlapping_names();
            if !names.is_empty() {
                return Err(BindError::SynthesisConflict {
                    class: descriptor.name().to_string(),
                    names,
                });
            }
        }

        let mut table: IndexMap<String, AttrKind> = base
            .effective_attrs()
            .iter()
            .map(|(name, kind)| (name.to_string(), kind))
            .collect();
        for method in descriptor.public_methods() {
            table.insert(method.clone(), AttrKind::PlainForward);
        }
        for field in descriptor.public_fields() {
            table.insert(field.clone(), AttrKind::PropertyForward);
        }
        Ok(table.into_iter().collect())
    }

    /// Build a new class mirroring `descriptor`, derived from `base`
    pub fn synthesize(&self, descriptor: &ClassDescriptor, base: &ClassRef) -> BindResult<ClassRef> {
        let entries = self.attribute_entries(descriptor, base)?;
        tracing::debug!(
            class = descriptor.name(),
            identity = ?descriptor.identity(),
            fields = descriptor.public_fields().len(),
            methods = descriptor.public_methods().len(),
            "synthesizing proxy class"
        );

        ClassDef::new(descriptor.name())
            .extends(base)
            .default_attrs(entries)
            .generator(descriptor.generator())
            .doc(class_doc(descriptor.name()))
            .define()
    }
}

/// Description attached to synthesized classes
pub fn class_doc(name: &str) -> String {
    format!(
        "Mapped R6 class \"{name}\".\n\n\
         The class is created dynamically from the R6 class definition\n\
         in the foreign runtime.\n"
    )
}
