//! 引擎配置
//!
//! 所有站点相关的常量（版权所有者、弹窗函数、表格形状库、图片标题表）都从这里读取，
//! 支持 TOML 文件、环境变量和默认值三级来源。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Context, RetrofitError, RetrofitResult};

pub const CC_BY_SA_HREF: &str = "https://creativecommons.org/licenses/by-sa/4.0/";
pub const FOOTER_BADGE_SRC: &str = "https://i.creativecommons.org/l/by-sa/4.0/88x31.png";
pub const DEFAULT_STYLESHEET: &str = "/styles/gsarchive.css";
pub const DEFAULT_PADDING_THRESHOLD: u32 = 4;

/// 单元格背景代码：边框、间隙、左上角、右上角
pub const CODE_BORDER: char = 'B';
pub const CODE_GAP: char = 'G';
pub const CODE_TOP_LEFT: char = 'L';
pub const CODE_TOP_RIGHT: char = 'R';
pub const CODE_OTHER: char = 'x';

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub copyright: CopyrightConfig,
    pub resources: ResourceConfig,
    pub scripts: ScriptConfig,
    pub tables: TableConfig,
    pub images: ImageConfig,
    pub walk: WalkConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CopyrightConfig {
    /// 版权所有者名称的正则片段
    pub owners: Vec<String>,
    /// 可以自动删除的固定残留文本
    pub labels: Vec<String>,
    /// `mailto:` 联系地址 → 其他作者的名字
    pub third_party: BTreeMap<String, String>,
    pub license_href: String,
}

impl Default for CopyrightConfig {
    fn default() -> Self {
        CopyrightConfig {
            owners: vec![
                r"Gilber[e]?t\s*(and|&)\s*Sulliv[ae]n\s*Arch[i]?ve".to_string(),
                r"Paul\s*Howarth".to_string(),
                r"Colin\s*Johnson".to_string(),
            ],
            labels: vec!["MIDI files".to_string()],
            third_party: BTreeMap::from([("dstone4@cox.net".to_string(), "David Stone".to_string())]),
            license_href: CC_BY_SA_HREF.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub stylesheet: String,
    /// 弹窗链接依赖的脚本；未设置时不注入
    pub popup_script: Option<String>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        ResourceConfig {
            stylesheet: DEFAULT_STYLESHEET.to_string(),
            popup_script: None,
        }
    }
}

/// 弹窗函数的参数映射
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PopupRewrite {
    pub href_arg: usize,
    #[serde(default)]
    pub title_arg: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub prefixes: Vec<String>,
    pub rewrites: BTreeMap<String, PopupRewrite>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        ScriptConfig {
            prefixes: vec!["openPop".to_string()],
            rewrites: BTreeMap::from([
                (
                    "openPopImg".to_string(),
                    PopupRewrite {
                        href_arg: 0,
                        title_arg: Some(1),
                    },
                ),
                (
                    "openPopWin".to_string(),
                    PopupRewrite {
                        href_arg: 0,
                        title_arg: None,
                    },
                ),
            ]),
        }
    }
}

/// 背景标记 → 单元格代码
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CellCode {
    pub code: char,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MastheadConfig {
    pub images: Vec<String>,
    pub texts: Vec<String>,
}

/// 一种可识别的框架布局：每行一串单元格代码
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LayoutConfig {
    pub name: String,
    pub rows: Vec<String>,
}

impl LayoutConfig {
    pub fn signature(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.chars().count()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TableConfig {
    pub padding_threshold: u32,
    pub cell_codes: Vec<CellCode>,
    pub masthead: MastheadConfig,
    pub layouts: Vec<LayoutConfig>,
    /// 横幅、内容、页脚三张相邻表格的宽度
    pub group_widths: Vec<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            padding_threshold: DEFAULT_PADDING_THRESHOLD,
            cell_codes: vec![
                CellCode {
                    code: CODE_TOP_LEFT,
                    images: vec!["corner_tl.gif".to_string(), "tl.gif".to_string()],
                    colors: vec![],
                },
                CellCode {
                    code: CODE_TOP_RIGHT,
                    images: vec!["corner_tr.gif".to_string(), "tr.gif".to_string()],
                    colors: vec![],
                },
                CellCode {
                    code: CODE_BORDER,
                    images: vec!["border.gif".to_string(), "edge.gif".to_string()],
                    colors: vec!["#000080".to_string(), "navy".to_string()],
                },
                CellCode {
                    code: CODE_GAP,
                    images: vec![],
                    colors: vec!["#ffffff".to_string(), "white".to_string()],
                },
            ],
            masthead: MastheadConfig {
                images: vec!["gsarchive.gif".to_string(), "masthead.gif".to_string()],
                texts: vec!["Gilbert and Sullivan Archive".to_string()],
            },
            layouts: vec![
                LayoutConfig {
                    name: "frame".to_string(),
                    rows: vec!["LBR".to_string(), "BxB".to_string(), "BBB".to_string()],
                },
                LayoutConfig {
                    name: "banner".to_string(),
                    rows: vec!["LBR".to_string(), "BGxGB".to_string(), "BBB".to_string()],
                },
            ],
            group_widths: vec!["100%".to_string(), "90%".to_string(), "100%".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageConfig {
    /// `src` → 标题，用于补全 title/alt
    pub titles: BTreeMap<String, String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        let titles = [
            ("purple.gif", "Purple"),
            ("blue.gif", "Blue"),
            ("cyan.gif", "Cyan"),
            ("green.gif", "Green"),
            ("orange.gif", "Orange"),
            ("red.gif", "Red"),
            ("flags/auflag.gif", "Australian flag"),
            ("flags/canflag.gif", "Canadian flag"),
            ("flags/gbflag.gif", "British flag"),
            ("flags/usflag.gif", "Flag of USA"),
            ("flags/ireflag.png", "Irish flag"),
            ("flags/deflag.gif", "German flag"),
            // 标准页脚中的许可协议徽标
            (FOOTER_BADGE_SRC, "Creative Commons License"),
        ];
        ImageConfig {
            titles: titles
                .iter()
                .map(|(src, title)| (src.to_string(), title.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WalkConfig {
    pub skip_dirs: Vec<String>,
    pub extensions: Vec<String>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        WalkConfig {
            skip_dirs: vec!["backups".to_string(), "whowaswho".to_string()],
            extensions: vec!["html".to_string(), "htm".to_string()],
        }
    }
}

impl EngineConfig {
    /// 加载配置：显式路径优先，其次 `RETROFIT_CONFIG`，都没有时使用默认值
    pub fn load(path: Option<&Path>) -> RetrofitResult<Self> {
        use crate::env::{engine, EnvVar};

        let path: Option<PathBuf> = match path {
            Some(p) => Some(p.to_path_buf()),
            None => engine::ConfigPath::get().ok(),
        };

        let config = match path {
            Some(path) => {
                tracing::info!("loading engine configuration from {}", path.display());
                let text = fs::read_to_string(&path).context("Config file", path.display())?;
                Self::from_toml(&text).context("Config file", path.display())?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> RetrofitResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// 验证配置
    pub fn validate(&self) -> RetrofitResult<()> {
        if self.copyright.owners.is_empty() {
            return Err(RetrofitError::config("copyright.owners must not be empty"));
        }
        for owner in &self.copyright.owners {
            Regex::new(owner).context("Owner pattern", owner)?;
        }
        if self.scripts.prefixes.iter().all(|p| p.is_empty()) {
            return Err(RetrofitError::config("scripts.prefixes must not be empty"));
        }
        if self.resources.stylesheet.is_empty() {
            return Err(RetrofitError::config("resources.stylesheet must not be empty"));
        }

        let known: Vec<char> = self
            .tables
            .cell_codes
            .iter()
            .map(|c| c.code)
            .chain([CODE_OTHER])
            .collect();
        for layout in &self.tables.layouts {
            if layout.rows.is_empty() {
                return Err(RetrofitError::config(format!(
                    "layout '{}' has no rows",
                    layout.name
                )));
            }
            if let Some(bad) = layout.rows.iter().flat_map(|r| r.chars()).find(|c| !known.contains(c)) {
                return Err(RetrofitError::config(format!(
                    "layout '{}' uses unknown cell code '{}'",
                    layout.name, bad
                )));
            }
            let content_cells = layout
                .rows
                .iter()
                .flat_map(|r| r.chars())
                .filter(|c| *c == CODE_OTHER)
                .count();
            if content_cells != 1 {
                return Err(RetrofitError::config(format!(
                    "layout '{}' must have exactly one content cell, found {}",
                    layout.name, content_cells
                )));
            }
        }
        if self.tables.group_widths.len() != 3 {
            return Err(RetrofitError::config(
                "tables.group_widths must list exactly three widths",
            ));
        }

        Ok(())
    }

    /// `rel=license` 链接的两个可接受形式（https 与 http）
    pub fn license_hrefs(&self) -> [String; 2] {
        let https = self.copyright.license_href.clone();
        let http = match https.strip_prefix("https://") {
            Some(rest) => format!("http://{}", rest),
            None => https.clone(),
        };
        [https, http]
    }
}
