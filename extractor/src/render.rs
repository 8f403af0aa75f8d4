//! 简介渲染
//!
//! 每个站点一个模板, 字段缺失 (`None` 或空列表) 时整行省略.

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::models::*;
use crate::utils::indent_continuation;

/// 由站点数据生成 BBCode 简介
pub fn render(data: &MediaData) -> String {
    match data {
        MediaData::Douban(data) => render_douban(data),
        MediaData::Imdb(data) => render_imdb(data),
        MediaData::Bangumi(data) => render_bangumi(data),
        MediaData::Steam(data) => render_steam(data),
        MediaData::Indienova(data) => render_indienova(data),
        MediaData::Epic(data) => render_epic(data),
    }
}

/// 逐行拼接, 空值跳过
#[derive(Default)]
struct Descr {
    out: String,
}

impl Descr {
    fn image(&mut self, url: Option<&str>) {
        if let Some(url) = url {
            self.out.push_str(&format!("[img]{url}[/img]\n\n"));
        }
    }

    fn raw(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn line(&mut self, label: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.out.push_str(&format!("{label}{value}\n"));
        }
    }

    fn joined(&mut self, label: &str, items: &[String], sep: &str) {
        if !items.is_empty() {
            self.out.push_str(&format!("{label}{}\n", items.join(sep)));
        }
    }

    /// 带标题的区块, 内容后空一行
    fn section(&mut self, header: &str, body: Option<&str>) {
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            self.out.push_str(&format!("{header}\n\n{body}\n\n"));
        }
    }

    fn images(&mut self, header: &str, urls: &[String]) {
        if !urls.is_empty() {
            let body = urls
                .iter()
                .map(|url| format!("[img]{url}[/img]"))
                .collect::<Vec<_>>()
                .join("\n");
            self.section(header, Some(body.as_str()));
        }
    }

    fn finish(self) -> String {
        self.out.trim().to_string()
    }
}

fn render_douban(data: &DoubanData) -> String {
    let mut d = Descr::default();
    let cast_indent = format!("\n{}  　", "　".repeat(4));

    d.image(data.poster.as_deref());
    d.joined("◎译　　名　", &data.trans_title, "/");
    d.joined("◎片　　名　", &data.this_title, "/");
    d.line("◎年　　代　", data.year.as_deref());
    d.joined("◎产　　地　", &data.region, " / ");
    d.joined("◎类　　别　", &data.genre, " / ");
    d.joined("◎语　　言　", &data.language, " / ");
    d.joined("◎上映日期　", &data.playdate, " / ");
    d.line("◎IMDb评分  ", data.imdb_rating.as_ref().map(|r| r.text.as_str()));
    d.line("◎IMDb链接  ", data.imdb_link.as_deref());
    d.line("◎豆瓣评分　", data.douban_rating.as_ref().map(|r| r.text.as_str()));
    d.line("◎豆瓣链接　", Some(data.douban_link.as_str()));
    d.line("◎集　　数　", data.episodes.as_deref());
    d.line("◎片　　长　", data.duration.as_deref());
    d.joined("◎导　　演　", &data.director, " / ");
    d.joined("◎编　　剧　", &data.writer, " / ");
    d.joined("◎主　　演　", &data.cast, &cast_indent);
    d.joined("\n◎标　　签　", &data.tags, " | ");
    if let Some(intro) = data.introduction.as_deref() {
        d.raw(&format!("\n◎简　　介\n\n　　{}\n", indent_continuation(intro, "　　")));
    }
    if let Some(awards) = data.awards.as_deref() {
        d.raw(&format!("\n◎获奖情况\n\n　　{}\n", indent_continuation(awards, "　　")));
    }

    d.finish()
}

fn render_imdb(data: &ImdbData) -> String {
    fn names(people: &[Person]) -> Vec<String> {
        people.iter().map(|p| p.name.clone()).collect()
    }

    let mut d = Descr::default();

    d.image(data.poster.as_deref());
    d.line("Title: ", data.name.as_deref());
    d.joined("Keywords: ", &data.keywords, ", ");
    d.line("Date Published: ", data.date_published.as_deref());
    d.line("IMDb Rating: ", data.imdb_rating.as_ref().map(|r| r.text.as_str()));
    d.line("IMDb Link: ", Some(data.imdb_link.as_str()));
    d.joined("Directors: ", &names(&data.directors), " / ");
    d.joined("Creators: ", &names(&data.creators), " / ");
    d.joined("Actors: ", &names(&data.actors), " / ");
    if let Some(description) = data.description.as_deref() {
        d.raw(&format!(
            "\nIntroduction\n    {}\n",
            indent_continuation(description, "　　")
        ));
    }

    d.finish()
}

fn render_bangumi(data: &BangumiData) -> String {
    let mut d = Descr::default();

    // 前四项通常为中文名, 话数, 放送开始, 放送星期
    let staff = data
        .staff
        .iter()
        .skip(4)
        .take(15)
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .collect::<Vec<_>>();
    let cast = data.cast.iter().take(9).cloned().collect::<Vec<_>>();

    d.image(data.poster.as_deref());
    d.section("[b]Story: [/b]", data.story.as_deref());
    d.section("[b]Staff: [/b]", Some(staff.join("\n").as_str()));
    d.section("[b]Cast: [/b]", Some(cast.join("\n").as_str()));
    d.line("", Some(format!("(来源于 {} )", data.alt).as_str()));

    d.finish()
}

fn render_steam(data: &SteamData) -> String {
    let mut d = Descr::default();

    d.image(data.poster.as_deref());
    d.raw("【基本信息】\n\n");
    d.line("中文名: ", data.name_chs.as_deref());
    d.line("", data.detail.as_deref());
    d.line("官方网站: ", data.linkbar.as_deref());
    d.line(
        "Steam页面: ",
        Some(format!("https://store.steampowered.com/app/{}/", data.steam_id).as_str()),
    );
    d.joined("游戏语种: ", &data.language, " | ");
    d.joined("标签: ", &data.tags, " | ");
    d.joined("\n", &data.review, "\n");
    d.raw("\n");
    d.section("【游戏简介】", data.descr.as_deref());
    d.section("【配置需求】", Some(data.sysreq.join("\n").as_str()));
    d.images("【游戏截图】", &data.screenshot);

    d.finish()
}

fn render_indienova(data: &IndienovaData) -> String {
    let mut d = Descr::default();
    let tags = data.cat.iter().take(8).cloned().collect::<Vec<_>>();
    let links = data
        .links
        .iter()
        .map(|link| format!("[url={}]{}[/url]", link.url, link.site))
        .collect::<Vec<_>>();

    d.image(data.poster.as_deref());
    d.raw("【基本信息】\n\n");
    d.line("中文名称：", data.chinese_title.as_deref());
    d.line("英文名称：", data.english_title.as_deref());
    d.line("其他名称：", data.another_title.as_deref());
    d.line("发行时间：", data.release_date.as_deref());
    d.line("评分：", data.rate.as_deref());
    d.joined("开发商：", &data.dev, " / ");
    d.joined("发行商：", &data.publisher, " / ");
    d.joined("", &data.intro_detail, "\n");
    d.joined("标签：", &tags, " | ");
    d.joined("链接地址：", &links, "  ");
    d.joined("价格信息：", &data.price, " / ");
    d.raw("\n");
    d.section("【游戏简介】", data.descr.as_deref());
    d.images("【游戏截图】", &data.screenshot);
    d.images("【游戏评级】", &data.level);

    d.finish()
}

fn render_epic(data: &EpicData) -> String {
    let mut d = Descr::default();

    d.image(data.poster.as_deref());
    d.raw("【基本信息】\n\n");
    d.line("游戏名称：", data.name.as_deref());
    d.line("商店链接：", data.epic_link.as_deref());
    d.raw("\n");
    d.section("【支持语言】", Some(data.language.join("\n").as_str()));
    d.section("【游戏简介】", data.desc.as_deref());

    let columns: [(&str, fn(&SystemRequirements) -> &[String]); 2] = [
        ("【最低配置】", |r| r.minimum.as_slice()),
        ("【推荐配置】", |r| r.recommended.as_slice()),
    ];
    if !data.requirements.is_empty() {
        for (header, column) in columns {
            d.raw(&format!("{header}\n\n"));
            for req in &data.requirements {
                d.raw(&format!("{}\n{}\n", req.system, column(req).join("\n")));
            }
            d.raw("\n\n");
        }
    }

    d.images("【游戏截图】", &data.screenshot);
    d.images("【游戏评级】", &data.level);

    d.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn douban_sample() -> DoubanData {
        DoubanData {
            chinese_title: "黑客帝国".to_string(),
            foreign_title: Some("The Matrix".to_string()),
            aka: vec!["Alpha".to_string(), "Bravo".to_string()],
            trans_title: vec!["黑客帝国".to_string(), "Alpha".to_string(), "Bravo".to_string()],
            this_title: vec!["The Matrix".to_string()],
            year: Some("1999".to_string()),
            region: vec!["美国".to_string(), "澳大利亚".to_string()],
            genre: vec!["动作".to_string(), "科幻".to_string()],
            playdate: vec!["1999-03-31(美国)".to_string()],
            duration: Some("136分钟".to_string()),
            douban_link: "https://movie.douban.com/subject/1291843/".to_string(),
            douban_rating: Some(Rating::new(9.0, 512345)),
            director: vec!["莉莉·沃卓斯基".to_string()],
            cast: vec!["基努·里维斯".to_string(), "凯瑞-安·莫斯".to_string()],
            tags: vec!["科幻".to_string(), "经典".to_string()],
            introduction: Some("第一行\n第二行".to_string()),
            poster: Some("https://img1.doubanio.com/p.jpg".to_string()),
            ..Default::default()
        }
    }

    /// 取出以 `◎` 开头的标签行, 返回 (标签, 值)
    fn labeled_lines(format: &str) -> Vec<(String, String)> {
        format
            .lines()
            .filter_map(|line| line.strip_prefix('◎'))
            .map(|line| {
                let label = line.chars().take(4).collect::<String>();
                let value = line.chars().skip(4).collect::<String>();
                (label, value.trim_start_matches(['　', ' ']).to_string())
            })
            .collect()
    }

    #[test]
    fn test_douban_labels_round_trip() {
        let data = douban_sample();
        let format = render(&MediaData::Douban(data.clone()));
        let lines = labeled_lines(&format);
        let value = |label: &str| {
            lines
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(value("译　　名"), Some(data.trans_title.join("/").as_str()));
        assert_eq!(value("片　　名"), Some("The Matrix"));
        assert_eq!(value("年　　代"), data.year.as_deref());
        assert_eq!(value("产　　地"), Some("美国 / 澳大利亚"));
        assert_eq!(value("类　　别"), Some("动作 / 科幻"));
        assert_eq!(value("上映日期"), Some("1999-03-31(美国)"));
        assert_eq!(value("豆瓣评分"), Some("9/10 from 512,345 users"));
        assert_eq!(value("豆瓣链接"), Some(data.douban_link.as_str()));
        assert_eq!(value("片　　长"), Some("136分钟"));
        assert_eq!(value("导　　演"), Some("莉莉·沃卓斯基"));
        assert_eq!(value("标　　签"), Some("科幻 | 经典"));
        assert!(value("简　　介").is_some());

        // 缺失的字段不出现
        assert_eq!(value("语　　言"), None);
        assert_eq!(value("集　　数"), None);
        assert_eq!(value("编　　剧"), None);
        assert!(!format.contains("IMDb"));
        assert!(!format.contains("获奖情况"));
    }

    #[test]
    fn test_douban_aka_order() {
        let format = render(&MediaData::Douban(douban_sample()));
        assert!(format.contains("◎译　　名　黑客帝国/Alpha/Bravo\n"));
    }

    #[test]
    fn test_douban_block_indent() {
        let format = render(&MediaData::Douban(douban_sample()));

        assert!(format.contains("◎主　　演　基努·里维斯\n　　　　  　凯瑞-安·莫斯\n"));
        assert!(format.ends_with("◎简　　介\n\n　　第一行\n　　第二行"));
    }

    #[test]
    fn test_poster_omitted() {
        let data = DoubanData {
            poster: None,
            ..douban_sample()
        };
        let format = render(&MediaData::Douban(data));

        assert!(!format.contains("[img]"));
        assert!(format.starts_with("◎译　　名"));

        let steam = SteamData {
            steam_id: "570".to_string(),
            ..Default::default()
        };
        assert!(render(&MediaData::Steam(steam)).starts_with("【基本信息】\n\nSteam页面: "));
    }

    #[test]
    fn test_imdb_template() {
        let data = ImdbData {
            imdb_link: "https://www.imdb.com/title/tt0133093/".to_string(),
            name: Some("The Matrix".to_string()),
            poster: Some("https://m.media-amazon.com/matrix.jpg".to_string()),
            keywords: vec!["kung fu".to_string(), "hacker".to_string()],
            directors: vec![Person {
                name: "Lana Wachowski".to_string(),
                url: None,
            }],
            description: Some("Neo.".to_string()),
            ..Default::default()
        };

        assert_eq!(
            render(&MediaData::Imdb(data)),
            "[img]https://m.media-amazon.com/matrix.jpg[/img]\n\n\
             Title: The Matrix\n\
             Keywords: kung fu, hacker\n\
             IMDb Link: https://www.imdb.com/title/tt0133093/\n\
             Directors: Lana Wachowski\n\
             \n\
             Introduction\n    Neo."
        );
    }

    #[test]
    fn test_bangumi_windows() {
        let data = BangumiData {
            alt: "https://bgm.tv/subject/253".to_string(),
            staff: (0..30).map(|i| format!("staff{i}")).collect(),
            cast: (0..12).map(|i| format!("cast{i}")).collect(),
            ..Default::default()
        };
        let format = render(&MediaData::Bangumi(data));

        assert!(format.starts_with("[b]Staff: [/b]\n\nstaff4\n"));
        assert!(format.contains("staff18\n\n[b]Cast: [/b]"));
        assert!(!format.contains("staff19"));
        assert!(format.contains("cast8\n\n(来源于 https://bgm.tv/subject/253 )"));
        assert!(!format.contains("cast9"));
    }

    #[test]
    fn test_bangumi_window_before_blank_filter() {
        let mut staff = (0..30).map(|i| format!("staff{i}")).collect::<Vec<_>>();
        staff[2] = String::new();
        staff[6] = String::new();
        let data = BangumiData {
            alt: "https://bgm.tv/subject/253".to_string(),
            staff,
            ..Default::default()
        };
        let format = render(&MediaData::Bangumi(data));

        // 窗口按原始位置截取, 之后才去掉空条目
        assert!(format.starts_with("[b]Staff: [/b]\n\nstaff4\nstaff5\nstaff7\n"));
        assert!(format.contains("staff18\n\n(来源于"));
        assert!(!format.contains("staff19"));
        assert!(!format.contains("staff3"));
    }

    #[test]
    fn test_bangumi_short_staff_omitted() {
        let data = BangumiData {
            alt: "https://bgm.tv/subject/1".to_string(),
            staff: vec!["中文名: x".to_string()],
            ..Default::default()
        };
        assert_eq!(
            render(&MediaData::Bangumi(data)),
            "(来源于 https://bgm.tv/subject/1 )"
        );
    }

    /// 标题行之后必须紧跟内容
    fn assert_no_blank_heading(format: &str) {
        let lines = format.lines().collect::<Vec<_>>();
        for (i, line) in lines.iter().enumerate() {
            let heading = line.starts_with('【') || (line.starts_with("[b]") && line.ends_with("[/b]"));
            if heading {
                let body = lines.get(i + 2).copied().unwrap_or_default();
                assert!(
                    !body.is_empty() && !body.starts_with('【'),
                    "empty section {line:?} in {format:?}"
                );
            }
        }
    }

    #[test]
    fn test_imdb_sparse() {
        let data = ImdbData {
            imdb_link: "https://www.imdb.com/title/tt0000001/".to_string(),
            ..Default::default()
        };
        let format = render(&MediaData::Imdb(data.clone()));

        assert_eq!(format, "IMDb Link: https://www.imdb.com/title/tt0000001/");
        assert_eq!(format, render(&MediaData::Imdb(data)));
    }

    #[test]
    fn test_bangumi_sparse() {
        let data = BangumiData {
            alt: "https://bgm.tv/subject/1".to_string(),
            story: Some("故事".to_string()),
            ..Default::default()
        };
        let format = render(&MediaData::Bangumi(data.clone()));

        assert_eq!(format, "[b]Story: [/b]\n\n故事\n\n(来源于 https://bgm.tv/subject/1 )");
        assert_no_blank_heading(&format);
        assert_eq!(format, render(&MediaData::Bangumi(data)));
    }

    #[test]
    fn test_steam_sparse() {
        let data = SteamData {
            steam_id: "570".to_string(),
            name_chs: Some("刀塔2".to_string()),
            ..Default::default()
        };
        let format = render(&MediaData::Steam(data.clone()));

        assert_eq!(
            format,
            "【基本信息】\n\n中文名: 刀塔2\nSteam页面: https://store.steampowered.com/app/570/"
        );
        assert_no_blank_heading(&format);
        assert_eq!(format, render(&MediaData::Steam(data)));
    }

    #[test]
    fn test_steam_sections() {
        let data = SteamData {
            steam_id: "570".to_string(),
            descr: Some("简介".to_string()),
            screenshot: vec!["https://cdn/1.jpg".to_string()],
            ..Default::default()
        };
        let format = render(&MediaData::Steam(data));

        assert!(format.contains("【游戏简介】\n\n简介\n\n【游戏截图】"));
        assert!(!format.contains("【配置需求】"));
        assert_no_blank_heading(&format);
    }

    #[test]
    fn test_indienova_sparse() {
        let data = IndienovaData {
            chinese_title: Some("蔚蓝".to_string()),
            ..Default::default()
        };
        let format = render(&MediaData::Indienova(data.clone()));

        assert_eq!(format, "【基本信息】\n\n中文名称：蔚蓝");
        assert_eq!(format, render(&MediaData::Indienova(data)));
    }

    #[test]
    fn test_epic_sparse() {
        let data = EpicData {
            name: Some("Celeste".to_string()),
            desc: Some("登山".to_string()),
            ..Default::default()
        };
        let format = render(&MediaData::Epic(data.clone()));

        assert_eq!(format, "【基本信息】\n\n游戏名称：Celeste\n\n【游戏简介】\n\n登山");
        assert_no_blank_heading(&format);
        assert_eq!(format, render(&MediaData::Epic(data)));
    }

    #[test]
    fn test_epic_requirements() {
        let data = EpicData {
            name: Some("Celeste".to_string()),
            requirements: vec![SystemRequirements {
                system: "Windows".to_string(),
                minimum: vec!["内存: 2 GB".to_string()],
                recommended: vec!["内存: 4 GB".to_string()],
            }],
            level: vec!["https://cdn/esrb.png".to_string()],
            ..Default::default()
        };

        assert_eq!(
            render(&MediaData::Epic(data)),
            "【基本信息】\n\n游戏名称：Celeste\n\n\
             【最低配置】\n\nWindows\n内存: 2 GB\n\n\n\
             【推荐配置】\n\nWindows\n内存: 4 GB\n\n\n\
             【游戏评级】\n\n[img]https://cdn/esrb.png[/img]"
        );
    }

    #[test]
    fn test_indienova_links() {
        let data = IndienovaData {
            chinese_title: Some("蔚蓝".to_string()),
            links: vec![
                StoreLink {
                    site: "Steam".to_string(),
                    url: "https://store.steampowered.com/app/504230/".to_string(),
                },
                StoreLink {
                    site: "官网".to_string(),
                    url: "http://www.celestegame.com/".to_string(),
                },
            ],
            cat: (0..10).map(|i| format!("t{i}")).collect(),
            ..Default::default()
        };
        let format = render(&MediaData::Indienova(data));

        assert!(format.contains(
            "链接地址：[url=https://store.steampowered.com/app/504230/]Steam[/url]  [url=http://www.celestegame.com/]官网[/url]\n"
        ));
        assert!(format.contains("标签：t0 | t1 | t2 | t3 | t4 | t5 | t6 | t7\n"));
    }
}
