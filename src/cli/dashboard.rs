use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph, Tabs},
    Frame,
};

use crate::aggregator::{seasonality, Aggregate, Granularity, TrendDirection};
use crate::chart::{bar_values, line_points, to_rows, ChartRow};
use crate::cli::{load_outcome, SourceArgs};
use crate::elasticity::{ElasticityTable, PriceSweep};
use crate::error::Result;
use crate::fmt::{number, percent};
use crate::models::SalesRecord;
use crate::normalizer::normalize;
use crate::reports::{
    self, active, category_performance, customer_types, distinct, monthly_revenue_profit,
    simulation_report, top_regions, trend_report, CategoryPerformance, Filters, SimulationReport,
    SummaryStats, TrendReport,
};
use crate::settings::load_settings;
use crate::strategy::{
    ChangeType, NewStrategy, PricingStrategy, StrategyAction, StrategyBoard, StrategyStatus,
};
use crate::tui::{
    money_span, run_view, wrap_text, View, ViewAction, ACCENT_STYLE, AMOUNT_NEG_STYLE,
    AMOUNT_POS_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE,
};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Patterns,
    Pricing,
    Strategies,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Self::Overview, Self::Patterns, Self::Pricing, Self::Strategies];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Patterns => "Patterns",
            Self::Pricing => "Pricing",
            Self::Strategies => "Strategies",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Values each filter can cycle through, taken from the unfiltered records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub customer_types: Vec<String>,
    pub categories: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[SalesRecord]) -> Self {
        let sorted = |mut v: Vec<String>| {
            v.sort();
            v
        };
        Self {
            regions: sorted(distinct(records, |r| r.region.as_str())),
            customer_types: sorted(distinct(records, |r| r.customer_type.as_str())),
            categories: sorted(distinct(records, |r| r.category.as_str())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    NextTab,
    PrevTab,
    GoTo(Tab),
    CycleRegion,
    CycleCustomerType,
    CycleCategory,
    ClearFilters,
    CycleGranularity,
    SelectNext,
    SelectPrev,
    SetStatus(StrategyStatus),
    Propose(NewStrategy),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub tab: Tab,
    pub filters: Filters,
    pub granularity: Granularity,
    pub board: StrategyBoard,
    /// Index into `ordered_strategies(&board)`.
    pub selected: usize,
    pub message: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            tab: Tab::Overview,
            filters: Filters::default(),
            granularity: Granularity::default(),
            board: StrategyBoard::seeded(),
            selected: 0,
            message: None,
        }
    }
}

/// Strategies grouped by status, in the order they are listed.
pub fn ordered_strategies(board: &StrategyBoard) -> Vec<&PricingStrategy> {
    StrategyStatus::ALL
        .iter()
        .flat_map(|status| board.by_status(*status))
        .collect()
}

fn position_of(board: &StrategyBoard, id: &str) -> usize {
    ordered_strategies(board)
        .iter()
        .position(|s| s.id == id)
        .unwrap_or(0)
}

/// Next option after the current one; past the last option wraps to "all".
fn cycle(current: &Option<String>, options: &[String]) -> Option<String> {
    match active(current).and_then(|c| options.iter().position(|o| o == c)) {
        None => options.first().cloned(),
        Some(i) => options.get(i + 1).cloned(),
    }
}

impl DashboardState {
    /// Apply one input, returning the next state.
    pub fn apply(&self, input: Input, options: &FilterOptions) -> DashboardState {
        let mut next = self.clone();
        next.message = None;
        match input {
            Input::NextTab => next.tab = self.tab.next(),
            Input::PrevTab => next.tab = self.tab.prev(),
            Input::GoTo(tab) => next.tab = tab,
            Input::CycleRegion => next.filters.region = cycle(&self.filters.region, &options.regions),
            Input::CycleCustomerType => {
                next.filters.customer_type =
                    cycle(&self.filters.customer_type, &options.customer_types)
            }
            Input::CycleCategory => {
                next.filters.category = cycle(&self.filters.category, &options.categories)
            }
            Input::ClearFilters => next.filters = Filters::default(),
            Input::CycleGranularity => next.granularity = self.granularity.next(),
            Input::SelectNext => {
                let count = self.board.strategies.len();
                next.selected = (self.selected + 1).min(count.saturating_sub(1));
            }
            Input::SelectPrev => next.selected = self.selected.saturating_sub(1),
            Input::SetStatus(status) => {
                let Some(strategy) = ordered_strategies(&self.board).get(self.selected).copied()
                else {
                    return next;
                };
                let action = StrategyAction::SetStatus {
                    id: strategy.id.clone(),
                    status,
                };
                match self.board.reduce(action) {
                    Ok(board) => {
                        next.selected = position_of(&board, &strategy.id);
                        next.board = board;
                        next.message = Some(format!("{} \u{2192} {}", strategy.name, status.label()));
                    }
                    Err(e) => next.message = Some(e.to_string()),
                }
            }
            Input::Propose(draft) => {
                let name = draft.name.clone();
                match self.board.reduce(StrategyAction::Create(draft)) {
                    Ok(board) => {
                        if let Some(created) = board.strategies.last() {
                            next.selected = position_of(&board, &created.id);
                        }
                        next.board = board;
                        next.tab = Tab::Strategies;
                        next.message = Some(format!("Proposed strategy: {name}"));
                    }
                    Err(e) => next.message = Some(e.to_string()),
                }
            }
        }
        next
    }
}

/// Key bindings. `n` (propose) and quit are handled by the dashboard itself.
pub fn input_for(tab: Tab, code: KeyCode) -> Option<Input> {
    let input = match code {
        KeyCode::Tab | KeyCode::Right => Input::NextTab,
        KeyCode::BackTab | KeyCode::Left => Input::PrevTab,
        KeyCode::Char('1') => Input::GoTo(Tab::Overview),
        KeyCode::Char('2') => Input::GoTo(Tab::Patterns),
        KeyCode::Char('3') => Input::GoTo(Tab::Pricing),
        KeyCode::Char('4') => Input::GoTo(Tab::Strategies),
        KeyCode::Char('r') => Input::CycleRegion,
        KeyCode::Char('c') => Input::CycleCustomerType,
        KeyCode::Char('C') => Input::CycleCategory,
        KeyCode::Char('0') => Input::ClearFilters,
        KeyCode::Char('g') => Input::CycleGranularity,
        KeyCode::Down | KeyCode::Char('j') if tab == Tab::Strategies => Input::SelectNext,
        KeyCode::Up | KeyCode::Char('k') if tab == Tab::Strategies => Input::SelectPrev,
        KeyCode::Char('a') if tab == Tab::Strategies => Input::SetStatus(StrategyStatus::Approved),
        KeyCode::Char('i') if tab == Tab::Strategies => {
            Input::SetStatus(StrategyStatus::Implemented)
        }
        KeyCode::Char('x') if tab == Tab::Strategies => Input::SetStatus(StrategyStatus::Rejected),
        KeyCode::Char('p') if tab == Tab::Strategies => Input::SetStatus(StrategyStatus::Proposed),
        _ => return None,
    };
    Some(input)
}

/// A strategy draft from the simulated revenue optimum, if there is one.
pub fn proposal(filters: &Filters, report: &SimulationReport, today: &str) -> Option<NewStrategy> {
    let optimal = report.optimal.as_ref()?;
    let category = active(&filters.category).unwrap_or("All");
    Some(NewStrategy {
        name: format!("Optimal pricing: {category}"),
        description: format!(
            "Simulated revenue peaks at a {} price change",
            percent(optimal.price_change)
        ),
        target_category: category.to_string(),
        target_region: active(&filters.region).map(str::to_string),
        price_change: optimal.price_change,
        change_type: ChangeType::Percentage,
        expected_impact: report.optimal_change.as_ref().map_or(0.0, |c| c.percent),
        implementation_date: today.to_string(),
        collaborators: vec!["Pricing Analyst".to_string()],
    })
}

// ---------------------------------------------------------------------------
// Derived view data
// ---------------------------------------------------------------------------

struct ViewData {
    summary: SummaryStats,
    monthly: Vec<ChartRow>,
    categories: Vec<CategoryPerformance>,
    customers: Vec<Aggregate>,
    trend: TrendReport,
    seasonality: Vec<ChartRow>,
    regions: Vec<Aggregate>,
    simulation: SimulationReport,
}

impl ViewData {
    fn derive(records: &[SalesRecord], state: &DashboardState, table: &ElasticityTable) -> Result<Self> {
        let records = state.filters.apply(records);
        Ok(Self {
            summary: reports::summary(&records),
            monthly: monthly_revenue_profit(&records),
            categories: category_performance(&records)?,
            customers: customer_types(&records),
            trend: trend_report(&records, state.granularity),
            seasonality: to_rows(&seasonality(&records), "month", "sales"),
            regions: top_regions(&records),
            simulation: simulation_report(&records, table, &PriceSweep::default())?,
        })
    }
}

// ---------------------------------------------------------------------------
// Dashboard view
// ---------------------------------------------------------------------------

struct Dashboard {
    records: Vec<SalesRecord>,
    options: FilterOptions,
    table: ElasticityTable,
    origin: &'static str,
    state: DashboardState,
    data: Option<ViewData>,
}

impl Dashboard {
    fn new(records: Vec<SalesRecord>, table: ElasticityTable, origin: &'static str) -> Self {
        let options = FilterOptions::from_records(&records);
        let mut dashboard = Self {
            records,
            options,
            table,
            origin,
            state: DashboardState::default(),
            data: None,
        };
        dashboard.refresh();
        dashboard
    }

    fn refresh(&mut self) {
        match ViewData::derive(&self.records, &self.state, &self.table) {
            Ok(data) => self.data = Some(data),
            Err(e) => {
                self.data = None;
                self.state.message = Some(format!("Error: {e}"));
            }
        }
    }

    fn propose(&mut self) {
        let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
        let draft = self
            .data
            .as_ref()
            .and_then(|d| proposal(&self.state.filters, &d.simulation, &today));
        match draft {
            Some(draft) => self.state = self.state.apply(Input::Propose(draft), &self.options),
            None => self.state.message = Some("No simulation result to propose".into()),
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let [title_area, tabs_area] =
            Layout::horizontal([Constraint::Length(46), Constraint::Fill(1)]).areas(area);
        frame.render_widget(
            Paragraph::new(format!(" pricewise \u{00b7} {}", self.origin)).style(HEADER_STYLE),
            title_area,
        );
        let tabs = Tabs::new(
            Tab::ALL
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{} {}", i + 1, t.title())),
        )
        .select(self.state.tab.index())
        .style(FOOTER_STYLE)
        .highlight_style(ACCENT_STYLE.add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, tabs_area);
    }

    fn draw_filters(&self, frame: &mut Frame, area: Rect) {
        let f = &self.state.filters;
        let label = |v: &Option<String>| active(v).unwrap_or("all").to_string();
        let line = Line::from(vec![
            Span::styled(" Region ", FOOTER_STYLE),
            Span::raw(label(&f.region)),
            Span::styled("  Customer ", FOOTER_STYLE),
            Span::raw(label(&f.customer_type)),
            Span::styled("  Category ", FOOTER_STYLE),
            Span::raw(label(&f.category)),
            Span::styled("  Granularity ", FOOTER_STYLE),
            Span::raw(self.state.granularity.key()),
        ]);
        let line = if f.is_empty() {
            line
        } else {
            let mut spans = line.spans;
            spans.push(Span::styled("  (0=clear)", ACCENT_STYLE));
            Line::from(spans)
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        if let Some(msg) = &self.state.message {
            frame.render_widget(
                Paragraph::new(format!(" {msg}")).style(Style::default().fg(Color::Yellow)),
                area,
            );
            return;
        }
        let hints = match self.state.tab {
            Tab::Strategies => {
                " Up/Down=select  a=approve  i=implemented  x=reject  p=proposed  Tab=next  q=quit"
            }
            Tab::Pricing => " n=propose optimum  r/c/C=filters  0=clear  Tab=next  q=quit",
            _ => " r=region  c=customer  C=category  0=clear  g=granularity  Tab=next  q=quit",
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), area);
    }

    fn draw_overview(&self, frame: &mut Frame, area: Rect, data: &ViewData) {
        let [stats_area, charts_area] =
            Layout::vertical([Constraint::Length(6), Constraint::Fill(1)]).areas(area);
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(stats_area);

        let s = &data.summary;
        let margin = s
            .average_margin
            .map_or_else(|| "n/a".to_string(), |m| format!("{m:.1}%"));
        let stats = vec![
            Line::from(vec![Span::raw(" Revenue        "), money_span(s.revenue)]),
            Line::from(format!(" Units sold     {}", number(s.units))),
            Line::from(format!(" Records        {}", s.records)),
            Line::from(format!(" Products       {}", s.products)),
            Line::from(format!(" Categories     {}", s.categories)),
            Line::from(format!(" Avg margin     {margin}")),
        ];
        frame.render_widget(Paragraph::new(stats), left);

        let mut lines = vec![bold_line(" Top Categories")];
        let width = data.categories.iter().map(|c| c.category.len()).max().unwrap_or(10);
        for c in data.categories.iter().take(5) {
            lines.push(Line::from(vec![
                Span::raw(format!(" {:<width$}  ", c.category)),
                money_span(c.sales),
                Span::styled(
                    c.average_margin
                        .map_or_else(String::new, |m| format!("  {m:.1}%")),
                    FOOTER_STYLE,
                ),
            ]));
        }
        frame.render_widget(Paragraph::new(lines), right);

        let [chart_left, chart_right] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(charts_area);
        draw_revenue_profit(frame, chart_left, &data.monthly);
        draw_ranking(frame, chart_right, " Sales by Customer Type", &data.customers);
    }

    fn draw_patterns(&self, frame: &mut Frame, area: Rect, data: &ViewData) {
        let [trend_area, bottom] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Fill(1)]).areas(area);

        let t = &data.trend;
        let (arrow, style) = match t.trend.direction {
            TrendDirection::Up => ("\u{2191}", AMOUNT_POS_STYLE),
            TrendDirection::Down => ("\u{2193}", AMOUNT_NEG_STYLE),
            TrendDirection::Neutral => ("\u{2192}", FOOTER_STYLE),
        };
        let change = t.trend.percentage.map_or_else(|| "n/a".to_string(), percent);
        let title = Line::from(vec![
            Span::styled(
                format!("Sales Trend ({}) ", t.granularity.key()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{arrow} {change}"), style),
        ]);
        let rows = to_rows(&t.series, "period", "sales");
        draw_line_chart(frame, trend_area, title, &rows, "sales");

        let [season_area, region_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(bottom);
        let values = bar_values(&data.seasonality, "sales");
        let bars: Vec<(&str, u64)> = values.iter().map(|(l, v)| (l.as_str(), *v)).collect();
        let chart = BarChart::default()
            .block(titled(" Seasonality"))
            .bar_width(3)
            .bar_gap(1)
            .bar_style(ACCENT_STYLE)
            .value_style(Style::default().fg(Color::Black).bg(Color::Rgb(100, 160, 250)))
            .data(bars.as_slice());
        frame.render_widget(chart, season_area);
        draw_ranking(frame, region_area, " Top Regions", &data.regions);
    }

    fn draw_pricing(&self, frame: &mut Frame, area: Rect, data: &ViewData) {
        let [chart_area, info_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(area);
        let sim = &data.simulation;
        let points: Vec<Aggregate> = sim
            .points
            .iter()
            .map(|p| Aggregate::new(percent(p.price_change), p.revenue))
            .collect();
        let rows = to_rows(&points, "change", "revenue");
        draw_line_chart(frame, chart_area, bold_line("Revenue by Price Change"), &rows, "revenue");

        let mut lines = vec![
            bold_line(" Current"),
            Line::from(vec![Span::raw(" Revenue        "), money_span(sim.current.revenue)]),
            Line::from(format!(" Units          {}", number(sim.current.units))),
            Line::from(vec![
                Span::raw(" Avg price      "),
                sim.current
                    .average_price
                    .map_or_else(|| Span::raw("n/a"), money_span),
            ]),
            Line::from(""),
            bold_line(" Optimum"),
        ];
        match &sim.optimal {
            Some(opt) => {
                lines.push(Line::from(vec![
                    Span::raw(" Price change   "),
                    Span::styled(percent(opt.price_change), ACCENT_STYLE),
                ]));
                lines.push(Line::from(vec![
                    Span::raw(" Revenue        "),
                    money_span(opt.revenue),
                ]));
                if let Some(change) = &sim.optimal_change {
                    lines.push(Line::from(vec![
                        Span::raw(" vs. current    "),
                        money_span(change.absolute),
                        Span::raw(format!(" ({})", percent(change.percent))),
                    ]));
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    " Press n to propose this as a strategy",
                    FOOTER_STYLE,
                )));
            }
            None => lines.push(Line::from(" No sales to simulate")),
        }
        frame.render_widget(Paragraph::new(lines), info_area);
    }

    fn draw_strategies(&self, frame: &mut Frame, area: Rect) {
        let [list_area, detail_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(7)]).areas(area);

        let ordered = ordered_strategies(&self.state.board);
        let mut lines = Vec::new();
        let mut index = 0;
        for status in StrategyStatus::ALL {
            let group = self.state.board.by_status(status);
            lines.push(Line::from(Span::styled(
                format!(" {} ({})", status.label(), group.len()),
                status_style(status),
            )));
            for s in group {
                let text = format!(
                    "   {:<34} {:<12} {:<12} {:>8}  {:>+6.1}%  {}",
                    s.name,
                    s.target_category,
                    s.target_region.as_deref().unwrap_or("All"),
                    s.change_label(),
                    s.expected_impact,
                    s.implementation_date,
                );
                let style = if index == self.state.selected {
                    SELECTED_STYLE
                } else {
                    Style::default()
                };
                lines.push(Line::from(Span::styled(text, style)));
                index += 1;
            }
        }
        frame.render_widget(Paragraph::new(lines), list_area);

        if let Some(s) = ordered.get(self.state.selected) {
            let width = detail_area.width.saturating_sub(4) as usize;
            let (description, _) = wrap_text(&s.description, width);
            let mut detail = vec![bold_line(&format!(" {}", s.name))];
            detail.extend(description.lines().map(|l| Line::from(format!(" {l}"))));
            detail.push(Line::from(Span::styled(
                format!(" Team: {}", s.collaborators.join(", ")),
                FOOTER_STYLE,
            )));
            frame.render_widget(
                Paragraph::new(detail).block(Block::default().borders(Borders::TOP).border_style(FOOTER_STYLE)),
                detail_area,
            );
        }
    }
}

impl View for Dashboard {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, filter_area, sep, body_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.draw_header(frame, header_area);
        self.draw_filters(frame, filter_area);
        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep,
        );

        if self.state.tab == Tab::Strategies {
            self.draw_strategies(frame, body_area);
        } else if let Some(data) = &self.data {
            match self.state.tab {
                Tab::Overview => self.draw_overview(frame, body_area, data),
                Tab::Patterns => self.draw_patterns(frame, body_area, data),
                Tab::Pricing => self.draw_pricing(frame, body_area, data),
                Tab::Strategies => {}
            }
        }
        self.draw_footer(frame, footer_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Char('n') if self.state.tab == Tab::Pricing => self.propose(),
            _ => {
                if let Some(input) = input_for(self.state.tab, code) {
                    let before = (self.state.filters.clone(), self.state.granularity);
                    self.state = self.state.apply(input, &self.options);
                    if before != (self.state.filters.clone(), self.state.granularity) {
                        self.refresh();
                    }
                }
            }
        }
        ViewAction::Continue
    }
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

fn bold_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn titled(title: &str) -> Block<'static> {
    Block::default()
        .title(title.to_string())
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .borders(Borders::NONE)
}

fn status_style(status: StrategyStatus) -> Style {
    let color = match status {
        StrategyStatus::Proposed => Color::Yellow,
        StrategyStatus::Approved => Color::Rgb(100, 160, 250),
        StrategyStatus::Implemented => Color::Rgb(80, 220, 100),
        StrategyStatus::Rejected => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn draw_ranking(frame: &mut Frame, area: Rect, title: &str, rows: &[Aggregate]) {
    let width = rows.iter().map(|a| a.key.len()).max().unwrap_or(10);
    let mut lines = vec![bold_line(title)];
    for a in rows.iter().take(area.height.saturating_sub(1) as usize) {
        lines.push(Line::from(vec![
            Span::raw(format!(" {:<width$}  ", a.key)),
            money_span(a.value),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

/// Monthly revenue and profit as paired bars with a rounded y-axis.
fn draw_revenue_profit(frame: &mut Frame, area: Rect, rows: &[ChartRow]) {
    if rows.is_empty() {
        return;
    }
    let revenue = bar_values(rows, "revenue");
    let profit = bar_values(rows, "profit");
    let max_val = revenue.iter().chain(&profit).map(|(_, v)| *v).max().unwrap_or(1) as f64;
    let (top_tick, mid_tick) = y_axis_ticks(max_val);
    let top_label = format_k(top_tick);
    let mid_label = format_k(mid_tick);
    let y_label_width = top_label.len().max(mid_label.len()) as u16 + 1;

    let [y_axis_area, bar_area] =
        Layout::horizontal([Constraint::Length(y_label_width), Constraint::Fill(1)]).areas(area);

    let inner_height = bar_area.height.saturating_sub(2);
    let mid_row = inner_height / 2;
    let mut y_lines: Vec<Line> = vec![Line::from("")];
    for row in 0..inner_height {
        let label = if row == 0 {
            top_label.as_str()
        } else if row == mid_row {
            mid_label.as_str()
        } else {
            ""
        };
        y_lines.push(Line::from(Span::styled(
            format!("{:>width$}", label, width = y_label_width as usize),
            FOOTER_STYLE,
        )));
    }
    frame.render_widget(Paragraph::new(y_lines), y_axis_area);

    let groups: Vec<BarGroup> = revenue
        .iter()
        .zip(&profit)
        .map(|((label, rev), (_, prof))| {
            let bars = vec![
                Bar::default().value(*rev).style(ACCENT_STYLE),
                Bar::default().value(*prof).style(AMOUNT_POS_STYLE),
            ];
            BarGroup::default()
                .label(Line::from(short_month(label)))
                .bars(&bars)
        })
        .collect();

    let mut chart = BarChart::default()
        .block(titled("Monthly Revenue & Profit"))
        .bar_width(2)
        .bar_gap(0)
        .group_gap(1);
    for group in &groups {
        chart = chart.data(group.clone());
    }
    frame.render_widget(chart, bar_area);
}

fn draw_line_chart(frame: &mut Frame, area: Rect, title: Line<'static>, rows: &[ChartRow], field: &str) {
    let points = line_points(rows, field);
    if points.is_empty() {
        frame.render_widget(Paragraph::new(title), area);
        return;
    }
    let max_y = points.iter().map(|(_, y)| *y).fold(0.0, f64::max);
    let min_y = points.iter().map(|(_, y)| *y).fold(max_y, f64::min).min(0.0);
    let top = if max_y > 0.0 { y_axis_ticks(max_y).0 } else { 1.0 };
    let max_x = (rows.len().saturating_sub(1)).max(1) as f64;

    let x_labels: Vec<String> = match rows {
        [] => Vec::new(),
        [only] => vec![only.label.clone()],
        [first, .., last] => vec![
            first.label.clone(),
            rows[rows.len() / 2].label.clone(),
            last.label.clone(),
        ],
    };
    let dataset = Dataset::default()
        .name(field.to_string())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(ACCENT_STYLE)
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(title).borders(Borders::NONE))
        .x_axis(
            Axis::default()
                .style(FOOTER_STYLE)
                .bounds([0.0, max_x])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(FOOTER_STYLE)
                .bounds([min_y, top])
                .labels(vec![format_k(min_y.max(0.0)), format_k(top / 2.0), format_k(top)]),
        );
    frame.render_widget(chart, area);
}

/// "2023-04" → "Apr"; other labels pass through.
fn short_month(label: &str) -> String {
    label
        .get(5..7)
        .and_then(|m| m.parse::<usize>().ok())
        .and_then(|m| crate::aggregator::MONTH_LABELS.get(m.wrapping_sub(1)))
        .map_or_else(|| label.to_string(), |m| m.to_string())
}

/// Pick round y-axis tick values (top and mid) given a max data value.
fn y_axis_ticks(max_val: f64) -> (f64, f64) {
    let steps = [
        100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 25000.0, 50000.0, 100000.0,
        250000.0, 500000.0, 1000000.0, 2500000.0, 5000000.0, 10000000.0,
    ];
    let top = steps
        .iter()
        .copied()
        .find(|&s| s >= max_val)
        .unwrap_or(max_val);
    (top, top / 2.0)
}

/// Compact dollar amount: "$Xk" or "$X.Xk" for thousands, "$XM" for millions.
fn format_k(val: f64) -> String {
    if val >= 1_000_000.0 {
        let m = val / 1_000_000.0;
        if m == m.floor() {
            format!("${}M", m as u64)
        } else {
            format!("${:.1}M", m)
        }
    } else if val >= 1000.0 {
        let k = val / 1000.0;
        if k == k.floor() {
            format!("${}k", k as u64)
        } else {
            format!("${:.1}k", k)
        }
    } else {
        format!("${}", val as u64)
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run(source: &SourceArgs) -> Result<()> {
    let settings = load_settings();
    let outcome = load_outcome(source, &settings)?;
    let records = normalize(&outcome.records);

    let origin = if outcome.fallback {
        "bundled sample data (fallback)"
    } else {
        outcome.origin.label()
    };
    let mut dashboard = Dashboard::new(records, settings.elasticity_table(), origin);
    if let Some(notice) = outcome.notice {
        dashboard.state.message = Some(notice);
    }
    run_view(&mut dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fixture::fixture_records;

    fn options() -> FilterOptions {
        FilterOptions {
            regions: vec!["California".into(), "Texas".into()],
            customer_types: vec!["Regular".into(), "VIP".into()],
            categories: vec!["Audio".into()],
        }
    }

    fn press(state: &DashboardState, code: KeyCode) -> DashboardState {
        let input = input_for(state.tab, code).expect("bound key");
        state.apply(input, &options())
    }

    #[test]
    fn test_tabs_wrap_both_ways() {
        let state = DashboardState::default();
        assert_eq!(press(&state, KeyCode::BackTab).tab, Tab::Strategies);
        let mut s = state.clone();
        for _ in 0..4 {
            s = press(&s, KeyCode::Tab);
        }
        assert_eq!(s.tab, Tab::Overview);
        assert_eq!(press(&state, KeyCode::Char('3')).tab, Tab::Pricing);
    }

    #[test]
    fn test_region_filter_cycles_back_to_all() {
        let s0 = DashboardState::default();
        let s1 = press(&s0, KeyCode::Char('r'));
        assert_eq!(s1.filters.region.as_deref(), Some("California"));
        let s2 = press(&s1, KeyCode::Char('r'));
        assert_eq!(s2.filters.region.as_deref(), Some("Texas"));
        let s3 = press(&s2, KeyCode::Char('r'));
        assert_eq!(s3.filters.region, None);
        // The previous state is untouched.
        assert_eq!(s1.filters.region.as_deref(), Some("California"));
    }

    #[test]
    fn test_clear_filters_and_granularity() {
        let s = press(&DashboardState::default(), KeyCode::Char('C'));
        let s = press(&s, KeyCode::Char('c'));
        assert!(!s.filters.is_empty());
        assert!(press(&s, KeyCode::Char('0')).filters.is_empty());
        assert_eq!(press(&s, KeyCode::Char('g')).granularity, Granularity::Quarterly);
    }

    #[test]
    fn test_status_keys_only_on_strategies_tab() {
        let state = DashboardState::default();
        assert_eq!(input_for(Tab::Overview, KeyCode::Char('a')), None);
        assert_eq!(
            input_for(Tab::Strategies, KeyCode::Char('x')),
            Some(Input::SetStatus(StrategyStatus::Rejected))
        );
        assert_eq!(state.tab, Tab::Overview);
    }

    #[test]
    fn test_set_status_follows_the_strategy() {
        let mut state = DashboardState::default();
        state.tab = Tab::Strategies;
        // Seeded order: Proposed (strategy-3), Approved (strategy-2), Implemented (strategy-1).
        assert_eq!(ordered_strategies(&state.board)[0].id, "strategy-3");
        let next = press(&state, KeyCode::Char('i'));
        let selected = ordered_strategies(&next.board)[next.selected];
        assert_eq!(selected.id, "strategy-3");
        assert_eq!(selected.status, StrategyStatus::Implemented);
        assert!(next.message.unwrap().contains("Implemented"));
        assert_eq!(state.board, StrategyBoard::seeded());
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut state = DashboardState::default();
        state.tab = Tab::Strategies;
        let up = press(&state, KeyCode::Up);
        assert_eq!(up.selected, 0);
        let mut s = state;
        for _ in 0..10 {
            s = press(&s, KeyCode::Down);
        }
        assert_eq!(s.selected, 2);
    }

    #[test]
    fn test_propose_adds_a_strategy() {
        let records = normalize(&fixture_records().unwrap());
        let report =
            simulation_report(&records, &ElasticityTable::default(), &PriceSweep::default()).unwrap();
        let filters = Filters {
            category: Some("Audio".into()),
            ..Default::default()
        };
        let draft = proposal(&filters, &report, "2024-03-01").unwrap();
        assert_eq!(draft.target_category, "Audio");

        let state = DashboardState::default().apply(Input::Propose(draft), &options());
        assert_eq!(state.tab, Tab::Strategies);
        assert_eq!(state.board.strategies.len(), 4);
        let selected = ordered_strategies(&state.board)[state.selected];
        assert_eq!(selected.id, "strategy-4");
        assert_eq!(selected.status, StrategyStatus::Proposed);
    }

    #[test]
    fn test_invalid_proposal_keeps_board() {
        let draft = NewStrategy::default();
        let state = DashboardState::default().apply(Input::Propose(draft), &options());
        assert_eq!(state.board, StrategyBoard::seeded());
        assert!(state.message.unwrap().contains("Missing required"));
    }

    #[test]
    fn test_view_data_respects_filters() {
        let records = normalize(&fixture_records().unwrap());
        let mut state = DashboardState::default();
        let all = ViewData::derive(&records, &state, &ElasticityTable::default()).unwrap();
        state.filters.region = Some("Texas".into());
        let texas = ViewData::derive(&records, &state, &ElasticityTable::default()).unwrap();
        assert!(texas.summary.revenue < all.summary.revenue);
        assert_eq!(texas.regions.len(), 1);
        assert_eq!(all.seasonality.len(), 12);
    }

    #[test]
    fn test_axis_helpers() {
        assert_eq!(y_axis_ticks(3200.0), (5000.0, 2500.0));
        assert_eq!(format_k(2500.0), "$2.5k");
        assert_eq!(format_k(1_000_000.0), "$1M");
        assert_eq!(short_month("2023-04"), "Apr");
        assert_eq!(short_month("2023-Q2"), "2023-Q2");
    }
}
