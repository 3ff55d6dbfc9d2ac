//! Row-by-row traversal of records through one binding.

use std::borrow::Cow;

use super::Binding;
use crate::record::SharedRecord;

/// Attaches each record of `records` to a binding in turn.
///
/// With `clone_per_row` off, every row hands out the same binding, so a
/// row's view is only valid until the next call. With it on, each row gets
/// an owned deep copy that can be kept after the cursor moves on.
pub struct RowCursor<I> {
    binding: Binding,
    records: I,
    clone_per_row: bool,
}

impl<I> RowCursor<I>
where
    I: Iterator<Item = SharedRecord>,
{
    pub fn new(binding: Binding, records: impl IntoIterator<IntoIter = I>, clone_per_row: bool) -> Self {
        Self {
            binding,
            records: records.into_iter(),
            clone_per_row,
        }
    }

    pub fn clone_per_row(&self) -> bool {
        self.clone_per_row
    }

    /// Bind the next record, or `None` once the records are exhausted.
    pub fn next_row(&mut self) -> Option<Cow<'_, Binding>> {
        let record = self.records.next()?;
        self.binding.attach_record(Some(record));
        if self.clone_per_row {
            Some(Cow::Owned(self.binding.clone()))
        } else {
            Some(Cow::Borrowed(&self.binding))
        }
    }

    pub fn binding_mut(&mut self) -> &mut Binding {
        &mut self.binding
    }

    pub fn into_binding(self) -> Binding {
        self.binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingBuilder;
    use crate::convert::ParseConverter;
    use crate::record::Record;
    use std::rc::Rc;

    fn rows(values: &[[&str; 2]]) -> Vec<SharedRecord> {
        let template = Record::new(["A", "B"], Default::default());
        values
            .iter()
            .map(|v| {
                let mut r = template.next_sibling();
                r.set_values(*v);
                r.into_shared()
            })
            .collect()
    }

    fn binding() -> Binding {
        let mut builder = BindingBuilder::new();
        builder
            .add_name("a", ["A"], ParseConverter::<i32>::new())
            .unwrap()
            .add_name("b", ["B"], ParseConverter::<i32>::new())
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_shared_binding_per_row() {
        let mut cursor = RowCursor::new(binding(), rows(&[["1", "2"], ["3", "4"]]), false);
        let mut sums = Vec::new();
        while let Some(row) = cursor.next_row() {
            assert!(matches!(row, Cow::Borrowed(_)));
            sums.push(row.get::<i32>("a").unwrap() + row.get::<i32>("b").unwrap());
        }
        assert_eq!(sums, vec![3, 7]);
    }

    #[test]
    fn test_cloned_rows_outlive_cursor_position() {
        let records = rows(&[["1", "2"], ["3", "4"]]);
        let mut cursor = RowCursor::new(binding(), records.clone(), true);
        let mut kept = Vec::new();
        while let Some(row) = cursor.next_row() {
            kept.push(row.into_owned());
        }

        assert_eq!(kept[0].get::<i32>("a").unwrap(), 1);
        assert_eq!(kept[1].get::<i32>("a").unwrap(), 3);
        assert!(Rc::ptr_eq(kept[0].record().unwrap(), &records[0]));
    }

    #[test]
    fn test_binding_can_change_between_rows() {
        let mut cursor = RowCursor::new(binding(), rows(&[["1", "2"], ["3", "4"]]), false);
        cursor.next_row();
        cursor.binding_mut().remove_by_name("b");
        let row = cursor.next_row().unwrap();
        assert_eq!(row.property_names().collect::<Vec<_>>(), vec!["a"]);
        assert!(cursor.next_row().is_none());
        assert_eq!(cursor.into_binding().len(), 1);
    }
}
