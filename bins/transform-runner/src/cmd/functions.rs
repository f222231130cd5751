use transform_engine::{FunctionCategory, FunctionDoc, Page, paginate, registry};

use crate::config::FunctionsArgs;
use crate::error::RunnerError;

pub fn run(args: FunctionsArgs) -> Result<(), RunnerError> {
    let page = list(&args)?;
    println!(
        "page {} ({} per page), {} functions in total",
        page.page_num, page.page_size, page.total
    );
    for doc in &page.items {
        println!("{:<12} {}\n    {}\n    e.g. {}", doc.category, doc.name, doc.explanation, doc.example);
    }
    Ok(())
}

fn list(args: &FunctionsArgs) -> Result<Page<&'static FunctionDoc>, RunnerError> {
    let category = args
        .category
        .as_deref()
        .map(str::parse::<FunctionCategory>)
        .transpose()
        .map_err(|detail| RunnerError::Config { context: "category", detail })?;
    Ok(paginate(registry().list_docs(category), args.page, args.size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(category: Option<&str>, page: usize, size: usize) -> FunctionsArgs {
        FunctionsArgs { category: category.map(String::from), page, size }
    }

    #[test]
    fn lists_one_category_paginated() {
        let page = list(&args(Some("Temporal"), 1, 3)).unwrap();
        assert_eq!(page.items.len(), 3);
        assert!(page.total > 3);
        assert!(page.items.iter().all(|d| d.category == FunctionCategory::Temporal));
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(matches!(
            list(&args(Some("geo"), 1, 0)),
            Err(RunnerError::Config { context: "category", .. })
        ));
    }
}
