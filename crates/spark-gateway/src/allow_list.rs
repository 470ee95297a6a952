//! 类别白名单。
//!
//! 空白名单表示放行全部类别；非空时只有列表中的类别可以被转发。

/// 排序、去重后的类别集合，构造后只读。
///
/// # 教案式说明
/// - **构造 (How)**：[`AllowList::parse`] 以空白字符切分配置文本，排序并去重；
/// - **查询 (What)**：[`AllowList::permits`] 在有序切片上二分查找，空列表恒为真。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowList {
    categories: Vec<String>,
}

impl AllowList {
    /// 放行全部类别的空白名单。
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// 解析以空格或制表符分隔的类别列表。
    pub fn parse(text: &str) -> Self {
        Self::from_categories(text.split_whitespace())
    }

    pub fn from_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut categories: Vec<String> = categories.into_iter().map(Into::into).collect();
        categories.sort();
        categories.dedup();
        Self { categories }
    }

    pub fn permits(&self, category: &str) -> bool {
        self.categories.is_empty()
            || self
                .categories
                .binary_search_by(|candidate| candidate.as_str().cmp(category))
                .is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}
