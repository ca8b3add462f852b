use serde_json::Value;

use super::dictionary::{ColumnDescriptor, DataDictionaryDocument};
use crate::models::TextBlock;

const NULL_TEXT: &str = "None";

fn render_example(value: &Value) -> String {
    match value {
        Value::Null => NULL_TEXT.to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render one column as the text that gets embedded.
pub fn render_column(document: &DataDictionaryDocument, column: &ColumnDescriptor) -> String {
    let examples = column
        .examples
        .iter()
        .map(render_example)
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "name: {}\ntype: {}\ndescription: {}\nnumber_of_rows: {}\nexamples: {}\nnull_rows: {}\ndistinct_rows: {}\nfrom table: {}",
        column.column_name,
        column.column_type,
        column.description.as_deref().unwrap_or(NULL_TEXT),
        column.number_of_rows,
        examples,
        column.null_rows,
        column.distinct_rows,
        document.qualified_table(),
    )
}

/// One block per column, in document order then column order, with ids
/// assigned sequentially from 0.
pub fn column_blocks(documents: &[DataDictionaryDocument]) -> Vec<TextBlock> {
    documents
        .iter()
        .flat_map(|doc| doc.columns.iter().map(move |col| render_column(doc, col)))
        .enumerate()
        .map(|(id, text)| TextBlock {
            id: id as i64,
            text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(name: &str, examples: Vec<Value>) -> ColumnDescriptor {
        ColumnDescriptor {
            column_name: name.to_string(),
            column_type: "string".to_string(),
            description: Some(format!("{} column", name)),
            number_of_rows: 10,
            null_rows: 1,
            distinct_rows: 9,
            examples,
        }
    }

    fn document(table: &str, columns: Vec<ColumnDescriptor>) -> DataDictionaryDocument {
        DataDictionaryDocument {
            catalog: "sales".to_string(),
            schema: "silver".to_string(),
            table: table.to_string(),
            columns,
        }
    }

    #[test]
    fn test_render_column() {
        let doc = document(
            "orders",
            vec![column("OrderNbr", vec![json!(1), json!("A-2"), json!(null), json!(true), json!(false)])],
        );

        let text = render_column(&doc, &doc.columns[0]);

        assert_eq!(
            text,
            "name: OrderNbr\n\
             type: string\n\
             description: OrderNbr column\n\
             number_of_rows: 10\n\
             examples: 1,A-2,None,True,False\n\
             null_rows: 1\n\
             distinct_rows: 9\n\
             from table: sales.silver.orders"
        );
    }

    #[test]
    fn test_blocks_follow_document_then_column_order() {
        let docs = vec![
            document(
                "orders",
                vec![column("a", vec![]), column("b", vec![]), column("c", vec![])],
            ),
            document("customers", vec![column("d", vec![]), column("e", vec![])]),
        ];

        let blocks = column_blocks(&docs);

        let ids: Vec<i64> = blocks.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert!(blocks[0].text.starts_with("name: a\n"));
        assert!(blocks[2].text.ends_with("sales.silver.orders"));
        assert!(blocks[3].text.starts_with("name: d\n"));
        assert!(blocks[4].text.ends_with("sales.silver.customers"));
    }

    #[test]
    fn test_missing_description_renders_none() {
        let mut col = column("CustomerName", vec![]);
        col.description = None;
        let doc = document("customers", vec![col]);

        assert!(render_column(&doc, &doc.columns[0]).contains("\ndescription: None\n"));
    }

    #[test]
    fn test_empty_examples_render_empty() {
        let doc = document("t", vec![column("x", vec![])]);
        assert!(render_column(&doc, &doc.columns[0]).contains("examples: \n"));
    }
}
