//! 分页规划
//!
//! 将「页号 + 页大小」换算为一次聚簇键区间扫描。底层存储只提供
//! 不透明的续页游标，不支持数值偏移：
//! - 第 1 页总是从聚簇顺序起点开始
//! - 后续每一页必须携带上一次调用返回的游标
//! - 没有游标的跳页请求（例如从第 1 页直接跳到第 5 页）退回
//!   第 1 页的数据。这是已知限制：存储无法高效定位任意偏移，
//!   这里不做偏移模拟。
//!
//! 按 before 时间戳的扫描在访问器层直接以 `created_at < ?` 播种，
//! 不受顺序走页约束。

use tracing::warn;

use crate::domain::model::PageToken;

/// 一次扫描的起点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStart {
    /// 聚簇顺序起点
    Beginning,
    /// 从游标处续扫
    Resume(PageToken),
}

/// 一次分页扫描计划
#[derive(Debug, Clone)]
pub struct PagePlan {
    pub start: ScanStart,
    pub limit: usize,
}

impl PagePlan {
    /// 续页游标（起点为聚簇顺序起点时为 None）
    pub fn resume(&self) -> Option<&PageToken> {
        match &self.start {
            ScanStart::Beginning => None,
            ScanStart::Resume(token) => Some(token),
        }
    }
}

/// 规划一次按页号的分页扫描
pub fn plan_page(page: u32, limit: u32, cursor: Option<PageToken>, max_page_size: u32) -> PagePlan {
    let limit = clamp_limit(limit, max_page_size);
    if page <= 1 {
        return PagePlan {
            start: ScanStart::Beginning,
            limit,
        };
    }
    match cursor {
        Some(token) => PagePlan {
            start: ScanStart::Resume(token),
            limit,
        },
        None => {
            // 无游标跳页：退回第 1 页，不猜测偏移
            warn!(page, "page requested without cursor, serving first page");
            PagePlan {
                start: ScanStart::Beginning,
                limit,
            }
        }
    }
}

/// 将页大小收敛到 [1, max_page_size]
pub fn clamp_limit(limit: u32, max_page_size: u32) -> usize {
    limit.clamp(1, max_page_size.max(1)) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_starts_at_beginning_and_ignores_cursor() {
        let plan = plan_page(1, 20, Some(PageToken::new("stale")), 100);
        assert_eq!(plan.start, ScanStart::Beginning);
        assert_eq!(plan.limit, 20);
    }

    #[test]
    fn subsequent_page_resumes_from_cursor() {
        let token = PageToken::new("abc");
        let plan = plan_page(2, 20, Some(token.clone()), 100);
        assert_eq!(plan.start, ScanStart::Resume(token));
    }

    #[test]
    fn page_jump_without_cursor_falls_back_to_first_page() {
        let plan = plan_page(5, 20, None, 100);
        assert_eq!(plan.start, ScanStart::Beginning);
    }

    #[test]
    fn limit_is_clamped_to_configured_bounds() {
        assert_eq!(plan_page(1, 0, None, 100).limit, 1);
        assert_eq!(plan_page(1, 500, None, 100).limit, 100);
        assert_eq!(plan_page(1, 50, None, 100).limit, 50);
    }
}
