/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use regex::Regex;
use syn::{DeriveInput, Ident, LitStr, parse_macro_input};

/// 提取器属性
///
/// # 使用示例
///
/// 在提取器类型上添加 `#[derive(Extractable)]` 并使用 `#[extractor(...)]` 属性指定站点与链接模式:
///
/// ```ignore
/// #[derive(Extractable)]
/// #[extractor(site = Bangumi, pattern = r"(?:https?://)?(?:bgm\.tv|bangumi\.tv|chii\.in)/subject/(\d+)/?")]
/// pub struct BangumiExtractor;
/// ```
///
/// 支持的属性:
/// - `site = Variant`: `crate::models::Site` 中对应的变体 (必须)
/// - `pattern = "..."`: 识别站点链接的正则, 有且仅有一个捕获组, 即站点内 id (必须)
///
/// 该宏会为类型生成 `Registered` 的实现, 以及供 `extractors::registry_items` 收集的注册函数.
/// 捕获组数量不为一时直接编译失败.
#[derive(Debug)]
struct ExtractorAttributes {
    site: Ident,
    pattern: LitStr,
}

impl ExtractorAttributes {
    fn from_input(input: &DeriveInput) -> Result<Self, syn::Error> {
        let mut site = None;
        let mut pattern = None;

        for attr in &input.attrs {
            if !attr.path().is_ident("extractor") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("site") {
                    site = Some(meta.value()?.parse::<Ident>()?);
                    Ok(())
                } else if meta.path.is_ident("pattern") {
                    pattern = Some(meta.value()?.parse::<LitStr>()?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported extractor attribute, expected `site` or `pattern`"))
                }
            })?;
        }

        let site = site.ok_or_else(|| {
            syn::Error::new_spanned(&input.ident, "Missing required attribute 'site'")
        })?;
        let pattern = pattern.ok_or_else(|| {
            syn::Error::new_spanned(&input.ident, "Missing required attribute 'pattern'")
        })?;

        validate_pattern(&pattern)?;

        Ok(ExtractorAttributes { site, pattern })
    }
}

/// 校验链接模式: 可编译, 且恰好一个捕获组
fn validate_pattern(pattern: &LitStr) -> Result<(), syn::Error> {
    let re = Regex::new(&pattern.value())
        .map_err(|e| syn::Error::new(pattern.span(), format!("invalid site pattern: {e}")))?;

    // captures_len 包含隐式的整体匹配组
    let groups = re.captures_len() - 1;
    if groups != 1 {
        return Err(syn::Error::new(
            pattern.span(),
            format!("site pattern must capture exactly one group (the site id), found {groups}"),
        ));
    }
    Ok(())
}

#[proc_macro_derive(Extractable, attributes(extractor))]
pub fn derive_extractable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let attrs = match ExtractorAttributes::from_input(&input) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };

    let site = attrs.site;
    let pattern = attrs.pattern;

    // 为每个提取器生成唯一的注册函数名 (全部大写以符合静态变量命名规范)
    let registry_item_name =
        format_ident!("__EXTRACTOR_REGISTRY_{}", name.to_string().to_uppercase());

    let expanded = quote! {
        impl crate::traits::Registered for #name {
            const SITE: crate::models::Site = crate::models::Site::#site;
            const PATTERN: &'static str = #pattern;
        }

        // 生成一个返回注册项的函数, 由手动注册表收集调用
        #[allow(non_snake_case)]
        pub fn #registry_item_name() -> crate::factory::ExtractorRegistryItem {
            crate::factory::ExtractorRegistryItem {
                site: crate::models::Site::#site,
                pattern: #pattern,
            }
        }
    };

    expanded.into()
}
