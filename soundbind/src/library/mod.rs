//! 音效库模块
//!
//! 定义音效（Sound）与标签页（Tab）等纯数据类型
//!
//! # 模块结构
//!
//! - `sound` - 音效定义、音源引用与 ID
//! - `tab` - 标签页定义与 ID

mod sound;
mod tab;

pub use sound::{Sound, SoundId, SoundSource};
pub use tab::{Tab, TabId};
