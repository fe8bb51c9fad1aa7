//! End-to-end tests for processors built from several operations.

#[cfg(test)]
mod tests {
    use crate::error::UpdateError;
    use crate::field::Field;
    use crate::lens::Lens;
    use crate::processor::{Processor, UpdateProcessor};
    use crate::result::UpdateResult;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Weak};
    use thiserror::Error;

    const FIELD_ONE: Field = Field::from_static("fieldOne");
    const STRING_LIST_FIELD: Field = Field::from_static("stringList");
    const POJO_LIST_FIELD: Field = Field::from_static("pojoList");

    #[derive(Debug, Error)]
    #[error("test exception")]
    struct TestError;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct TestPojo {
        field_one: Option<String>,
        string_list: Option<Vec<String>>,
        pojo_list: Option<Vec<TestPojo>>,
        /// Makes writes to `string_list` fail.
        locked: bool,
    }

    impl TestPojo {
        fn new(field_one: &str, string_list: &[&str]) -> Self {
            TestPojo {
                field_one: Some(field_one.to_string()),
                string_list: Some(string_list.iter().map(|s| s.to_string()).collect()),
                ..Default::default()
            }
        }
    }

    fn field_one() -> Lens<TestPojo, String> {
        Lens::optional(|p: &TestPojo| &p.field_one, |p: &mut TestPojo| &mut p.field_one)
    }

    fn string_list() -> Lens<TestPojo, Vec<String>> {
        Lens::optional(
            |p: &TestPojo| &p.string_list,
            |p: &mut TestPojo| &mut p.string_list,
        )
    }

    fn guarded_string_list() -> Lens<TestPojo, Vec<String>> {
        Lens::new(
            |p: &TestPojo| p.string_list.as_ref(),
            |p: &mut TestPojo| p.string_list.as_mut(),
            |p: &mut TestPojo, value: Option<Vec<String>>| {
                if p.locked {
                    return Err(TestError.into());
                }
                p.string_list = value;
                Ok(())
            },
        )
    }

    fn pojo_list() -> Lens<TestPojo, Vec<TestPojo>> {
        Lens::optional(
            |p: &TestPojo| &p.pojo_list,
            |p: &mut TestPojo| &mut p.pojo_list,
        )
    }

    fn first_char(s: &String) -> Option<char> {
        s.chars().next()
    }

    /// A processor whose `pojoList` elements are merged by the processor
    /// itself.
    fn recursive_processor() -> Arc<Processor<TestPojo>> {
        Arc::new_cyclic(|this: &Weak<Processor<TestPojo>>| {
            Processor::builder()
                .map(FIELD_ONE, field_one())
                .map(STRING_LIST_FIELD, guarded_string_list())
                .merge_list_with(
                    POJO_LIST_FIELD,
                    pojo_list(),
                    |p: &TestPojo| p.field_one.clone(),
                    this.clone(),
                )
                .build()
        })
    }

    #[test]
    fn test_execute() {
        let processor = Processor::builder()
            .map(FIELD_ONE, field_one())
            .merge_list(STRING_LIST_FIELD, string_list(), first_char)
            .build();

        let mut target = TestPojo::new("originalValue", &["1_1", "2_1", "3_1"]);
        let source = TestPojo::new("updatedValue", &["1_2", "4_2"]);

        let result = processor.execute(&mut target, &source).unwrap();

        assert!(result.has_updates());
        assert_eq!(result.to_string(), "{fieldOne,stringList{[0],[3]}}");
        assert_eq!(target.field_one.as_deref(), Some("updatedValue"));
        assert_eq!(
            target.string_list,
            TestPojo::new("", &["1_2", "2_1", "3_1", "4_2"]).string_list
        );
    }

    #[test]
    fn test_mapping_exception() {
        let processor = recursive_processor();

        let mut exception_pojo = TestPojo::new("someVal", &["2"]);
        exception_pojo.locked = true;
        let mut target = TestPojo {
            pojo_list: Some(vec![exception_pojo]),
            ..Default::default()
        };
        let source = TestPojo {
            pojo_list: Some(vec![TestPojo::new("someVal", &["1"])]),
            ..Default::default()
        };

        let err = processor.execute(&mut target, &source).unwrap_err();
        assert_eq!(err.path(), "pojoList[0].stringList");
        assert_eq!(
            err.to_string(),
            "Failed to update field: pojoList[0].stringList"
        );
        assert!(err.cause().is::<TestError>());
        assert_eq!(err.root_cause().to_string(), "test exception");
    }

    #[test]
    fn test_recursive_merge() {
        let processor = recursive_processor();

        let mut target = TestPojo {
            field_one: Some("root".to_string()),
            pojo_list: Some(vec![
                TestPojo::new("a", &["1"]),
                TestPojo::new("b", &["2"]),
            ]),
            ..Default::default()
        };
        let source = TestPojo {
            field_one: Some("root".to_string()),
            pojo_list: Some(vec![
                TestPojo::new("b", &["3"]),
                TestPojo::new("c", &["4"]),
            ]),
            ..Default::default()
        };

        let result = processor.execute(&mut target, &source).unwrap();
        assert_eq!(result.to_string(), "{pojoList{[1]{stringList},[2]}}");
        assert_eq!(result.paths(), vec!["pojoList[1].stringList", "pojoList[2]"]);
        assert_eq!(
            target.pojo_list,
            Some(vec![
                TestPojo::new("a", &["1"]),
                TestPojo::new("b", &["3"]),
                TestPojo::new("c", &["4"]),
            ])
        );
    }

    #[test]
    fn test_deep_failure_path() {
        // outer -> innerList[2] -> deepField
        let deep = Processor::builder()
            .map(
                "deepField",
                Lens::new(
                    |p: &TestPojo| p.field_one.as_ref(),
                    |p: &mut TestPojo| p.field_one.as_mut(),
                    |_: &mut TestPojo, _: Option<String>| Err(TestError.into()),
                ),
            )
            .build();
        let middle = Processor::builder()
            .merge_list_with(
                "innerList",
                pojo_list(),
                |p: &TestPojo| p.string_list.clone(),
                deep,
            )
            .build();
        let outer = Processor::builder()
            .map_with(
                "outer",
                Lens::optional(
                    |p: &(Option<TestPojo>,)| &p.0,
                    |p: &mut (Option<TestPojo>,)| &mut p.0,
                ),
                middle,
            )
            .build();

        let element = |key: &str, value: &str| TestPojo {
            field_one: Some(value.to_string()),
            string_list: Some(vec![key.to_string()]),
            ..Default::default()
        };
        let mut target = (Some(TestPojo {
            pojo_list: Some(vec![element("x", "1"), element("y", "1"), element("w", "1")]),
            ..Default::default()
        }),);
        let source = (Some(TestPojo {
            pojo_list: Some(vec![element("y", "1"), element("w", "2")]),
            ..Default::default()
        }),);

        let err = outer.execute(&mut target, &source).unwrap_err();
        assert_eq!(err.path(), "outer.innerList[2].deepField");
        assert!(err.cause().is::<TestError>());
    }

    #[test]
    fn test_no_rollback_on_failure() {
        let processor = Processor::builder()
            .map(FIELD_ONE, field_one())
            .map(STRING_LIST_FIELD, guarded_string_list())
            .build();

        let mut target = TestPojo::new("originalValue", &["1"]);
        target.locked = true;
        let source = TestPojo::new("updatedValue", &["2"]);

        let err = processor.execute(&mut target, &source).unwrap_err();
        assert_eq!(err.path(), "stringList");
        assert_eq!(target.field_one.as_deref(), Some("updatedValue"));
        assert_eq!(target.string_list, Some(vec!["1".to_string()]));
    }

    #[test]
    fn test_root_aggregation_order() {
        let processor = Processor::builder()
            .map("a", field_one())
            .map("b", string_list())
            .map("c", pojo_list())
            .build();

        let mut target = TestPojo {
            field_one: Some("same".to_string()),
            ..Default::default()
        };
        let source = TestPojo {
            field_one: Some("same".to_string()),
            string_list: Some(vec!["x".to_string()]),
            pojo_list: Some(vec![TestPojo::default()]),
            ..Default::default()
        };

        let result = processor.execute(&mut target, &source).unwrap();
        assert_eq!(
            result,
            UpdateResult::with_children(vec![
                UpdateResult::field(Field::from_static("b")),
                UpdateResult::field(Field::from_static("c")),
            ])
        );
        assert_eq!(result.to_string(), "{b,c}");
    }

    #[test]
    fn test_unchanged_source_reports_nothing() {
        let processor = recursive_processor();
        let mut target = TestPojo {
            pojo_list: Some(vec![TestPojo::new("a", &["1"])]),
            ..TestPojo::new("root", &["x"])
        };
        let source = target.clone();

        let result = processor.execute(&mut target, &source).unwrap();
        assert!(!result.has_updates());
        assert_eq!(target, source);
    }

    #[test]
    fn test_custom_processor_failure_wrapped_with_field() {
        struct Rejecting;

        impl UpdateProcessor<Vec<TestPojo>> for Rejecting {
            fn execute(
                &self,
                _: &mut Vec<TestPojo>,
                _: &Vec<TestPojo>,
            ) -> Result<UpdateResult, UpdateError> {
                Err(UpdateError::new(TestError))
            }
        }

        let processor = Processor::builder()
            .map_with(POJO_LIST_FIELD, pojo_list(), Rejecting)
            .build();
        let mut target = TestPojo {
            pojo_list: Some(vec![]),
            ..Default::default()
        };
        let source = TestPojo {
            pojo_list: Some(vec![TestPojo::default()]),
            ..Default::default()
        };

        let err = processor.execute(&mut target, &source).unwrap_err();
        assert_eq!(err.path(), "pojoList");
    }
}
