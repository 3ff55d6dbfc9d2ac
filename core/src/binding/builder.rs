//! Fluent construction of a [`Binding`].

use std::fmt::Debug;

use super::Binding;
use crate::config::WildcardTimeout;
use crate::convert::{MultiColumnConverter, TypeConverter};
use crate::error::BindResult;
use crate::property::{Accessor, Property};

/// Accumulates properties, then hands the binding over with [`build`].
///
/// Each `add*` call fails with the same errors as [`Binding::add`] and
/// leaves the builder unchanged on failure.
///
/// [`build`]: BindingBuilder::build
#[derive(Debug, Default)]
pub struct BindingBuilder {
    binding: Binding,
}

impl BindingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, property: impl Accessor) -> BindResult<&mut Self> {
        self.binding.add(property)?;
        Ok(self)
    }

    pub fn add_index<T: Clone + Debug + 'static>(
        &mut self,
        name: &str,
        index: usize,
        converter: impl TypeConverter<T> + 'static,
    ) -> BindResult<&mut Self> {
        self.add(Property::by_index(name, index, converter)?)
    }

    pub fn add_name<T, I, S>(
        &mut self,
        name: &str,
        aliases: I,
        converter: impl TypeConverter<T> + 'static,
    ) -> BindResult<&mut Self>
    where
        T: Clone + Debug + 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add(Property::by_name(name, aliases, converter)?)
    }

    pub fn add_name_with_timeout<T, I, S>(
        &mut self,
        name: &str,
        aliases: I,
        timeout: WildcardTimeout,
        converter: impl TypeConverter<T> + 'static,
    ) -> BindResult<&mut Self>
    where
        T: Clone + Debug + 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add(Property::by_name_with_timeout(
            name, aliases, timeout, converter,
        )?)
    }

    pub fn add_composite<T: Clone + Debug + 'static>(
        &mut self,
        name: &str,
        columns: Binding,
        converter: impl MultiColumnConverter<T> + 'static,
    ) -> BindResult<&mut Self> {
        self.add(Property::composite(name, columns, converter)?)
    }

    pub fn len(&self) -> usize {
        self.binding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binding.is_empty()
    }

    /// Take the binding built so far, leaving the builder empty.
    pub fn build(&mut self) -> Binding {
        std::mem::take(&mut self.binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{BoolConverter, ParseConverter, StringConverter};
    use crate::error::BindError;
    use crate::record::Record;

    #[test]
    fn test_chained_build() {
        let mut builder = BindingBuilder::new();
        builder
            .add_index("id", 0, ParseConverter::<u64>::new())
            .unwrap()
            .add_name("name", ["Name", "Full*"], StringConverter::new())
            .unwrap()
            .add_name_with_timeout(
                "active",
                ["Act?ve"],
                WildcardTimeout::from_millis(50),
                BoolConverter::new(),
            )
            .unwrap();
        assert_eq!(builder.len(), 3);

        let mut binding = builder.build();
        assert!(builder.is_empty());

        binding.attach_record(Some(
            Record::with_values(["Id", "Fullname", "Active"], ["4", "Ada L", "yes"]).into_shared(),
        ));
        assert_eq!(binding.get::<u64>("id").unwrap(), 4);
        assert_eq!(binding.get::<String>("name").unwrap(), "Ada L");
        assert!(binding.get::<bool>("active").unwrap());
    }

    #[test]
    fn test_failed_add_keeps_builder() {
        let mut builder = BindingBuilder::new();
        builder.add_index("id", 0, StringConverter::new()).unwrap();

        let dup = builder.add_index("id", 1, StringConverter::new());
        assert!(matches!(dup, Err(BindError::DuplicateName(_))));
        let bad = builder.add_name("not valid", ["X"], StringConverter::new());
        assert!(matches!(bad, Err(BindError::BadIdentifier(_))));

        assert_eq!(builder.build().property_names().collect::<Vec<_>>(), vec!["id"]);
    }
}
