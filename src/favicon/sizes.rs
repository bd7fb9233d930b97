//! # 尺寸集合模块
//!
//! ## 设计思路
//!
//! `SizeSpec` 是去重、升序、全部大于 0 的尺寸集合。调用方可能传入重复值、
//! 非正数或无法解析的文本，这里统一过滤，最终是否为空由编排层判定。
//!
//! `SizePreset` 对应常用的输出选项（全尺寸 ICO、全尺寸 ICO + PNG、单一尺寸、自定义）。

use std::collections::BTreeSet;
use std::str::FromStr;

use super::FaviconError;

/// 标准 favicon 尺寸。
pub const STANDARD_SIZES: [u32; 8] = [16, 24, 32, 48, 64, 96, 128, 256];

/// 去重、升序的正整数尺寸集合。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeSpec {
    sizes: BTreeSet<u32>,
}

impl SizeSpec {
    /// 标准全尺寸集合。
    pub fn standard() -> Self {
        Self::from_sizes(STANDARD_SIZES)
    }

    /// 从有符号整数构建，丢弃非正数与超出 `u32` 的值。
    pub fn from_sizes<I, T>(sizes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: TryInto<u32>,
    {
        let sizes = sizes
            .into_iter()
            .filter_map(|size| TryInto::<u32>::try_into(size).ok())
            .filter(|&size| size > 0)
            .collect();
        Self { sizes }
    }

    /// 解析逗号分隔的尺寸列表，例如 `"16, 32,48"`。
    ///
    /// 无法解析或非正的项被丢弃：`"0,-5,abc"` 得到空集合。
    ///
    /// # 示例
    /// ```rust
    /// use favicon_generator::favicon::SizeSpec;
    ///
    /// let spec = SizeSpec::parse_list("32, 16,abc,16,-5");
    /// assert_eq!(spec.to_vec(), vec![16, 32]);
    /// ```
    pub fn parse_list(input: &str) -> Self {
        let parsed: Vec<i64> = input
            .split(',')
            .filter_map(|item| {
                let item = item.trim();
                match item.parse::<i64>() {
                    Ok(size) => Some(size),
                    Err(_) => {
                        if !item.is_empty() {
                            log::debug!("🚫 忽略无法解析的尺寸：{:?}", item);
                        }
                        None
                    }
                }
            })
            .collect();
        Self::from_sizes(parsed)
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// 最大尺寸。
    pub fn max(&self) -> Option<u32> {
        self.sizes.last().copied()
    }

    /// 升序迭代。
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.sizes.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl FromIterator<u32> for SizeSpec {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self::from_sizes(iter)
    }
}

/// 常用输出选项。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizePreset {
    /// 全尺寸 ICO。
    All,
    /// 全尺寸 ICO + 每个尺寸的独立 PNG。
    AllWithPng,
    /// 单一尺寸 ICO。
    Single(u32),
    /// 自定义尺寸 ICO。
    Custom(SizeSpec),
}

impl FromStr for SizePreset {
    type Err = FaviconError;

    /// 解析预设名称：`all` / `all-png` / 正整数。
    fn from_str(preset: &str) -> Result<Self, Self::Err> {
        match preset.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "all-png" | "all+" => Ok(Self::AllWithPng),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|&s| s > 0)
                .map(Self::Single)
                .ok_or_else(|| {
                    FaviconError::InvalidRequest(format!(
                        "未知预设：{}（可选：all / all-png / 正整数尺寸）",
                        preset
                    ))
                }),
        }
    }
}

impl SizePreset {

    /// 展开为 `(尺寸集合, emit_ico, emit_png)`。
    pub fn resolve(&self) -> (SizeSpec, bool, bool) {
        match self {
            Self::All => (SizeSpec::standard(), true, false),
            Self::AllWithPng => (SizeSpec::standard(), true, true),
            Self::Single(size) => (SizeSpec::from_sizes([*size]), true, false),
            Self::Custom(spec) => (spec.clone(), true, false),
        }
    }
}
