//! Trend chart component for WebAssembly frontends.

pub mod format;
pub mod layout;

#[cfg(target_arch = "wasm32")]
mod styles;

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::format::{status_label, value_with_unit};
    use crate::layout::{ChartLayout, HEIGHT, WIDTH};
    use crate::styles;
    use exam_timeline_core::{Exam, HealthMetric, SeriesConfig};
    use exam_timeline_series::chart::metric_color;
    use exam_timeline_series::{
        date_key, metric_display_name, tooltip_entries, ChartModel, TrendSession, TrendView,
    };
    use serde_wasm_bindgen::from_value;
    use wasm_bindgen::prelude::*;
    use web_sys::{console, Document, Element, Window};
    use yew::prelude::*;

    const TICKS: usize = 5;

    enum TrendAction {
        ToggleMetric(String),
        ToggleExam(i64),
        Category(Option<String>),
    }

    #[derive(Properties, PartialEq)]
    pub struct TrendChartProps {
        pub exams: Vec<Exam>,
        pub metrics: Vec<HealthMetric>,
        pub config: SeriesConfig,
    }

    fn load_session(props: &TrendChartProps) -> TrendSession {
        let profile_id = props
            .exams
            .iter()
            .find_map(|exam| exam.profile_id)
            .unwrap_or_default();
        let mut session = TrendSession::new(props.config.clone());
        session.switch_profile(profile_id);
        session.receive_exams(profile_id, Ok(props.exams.clone()));
        session.receive_metrics(profile_id, Ok(props.metrics.clone()));
        session
    }

    #[function_component(TrendChart)]
    fn trend_chart(props: &TrendChartProps) -> Html {
        use_effect_with((), |_| {
            if let Some(window) = web_sys::window() {
                if let Some(document) = window.document() {
                    if let Err(err) = styles::ensure_styles(&document) {
                        console::error_1(&err);
                    }
                }
            }
            || ()
        });

        let session = use_mut_ref(|| load_session(props));
        let hovered = use_state(|| None::<usize>);
        let force_update = use_force_update();

        let on_action = {
            let session = session.clone();
            Callback::from(move |action: TrendAction| {
                {
                    let mut session = session.borrow_mut();
                    match action {
                        TrendAction::ToggleMetric(metric) => session.toggle_metric(&metric),
                        TrendAction::ToggleExam(exam_id) => session.toggle_exam(exam_id),
                        TrendAction::Category(category) => session.set_category(category.as_deref()),
                    }
                }
                force_update.force_update();
            })
        };

        let view = session.borrow().view();
        let body = match view {
            TrendView::Loading => render_empty("Carregando exames..."),
            TrendView::NoExams => render_empty("Nenhum exame encontrado"),
            TrendView::NoMetrics => render_empty("Nenhuma métrica extraída"),
            TrendView::NoExamSelected => html! {
                <>
                    { render_controls(&session, &on_action) }
                    { render_empty("Selecione pelo menos um exame") }
                </>
            },
            TrendView::NothingSelected => html! {
                <>
                    { render_controls(&session, &on_action) }
                    { render_empty("Selecione métricas para visualizar") }
                </>
            },
            TrendView::Chart(chart) => html! {
                <>
                    { render_controls(&session, &on_action) }
                    { render_plot(&chart, hovered.clone()) }
                    { render_tooltip(&session, *hovered) }
                    { render_metric_infos(&session) }
                </>
            },
        };

        html! {
            <section class="trend-root" aria-live="polite">
                <header class="trend-header">
                    <h2>{"Evolução dos exames"}</h2>
                    <p>{"Valores extraídos dos exames ao longo do tempo."}</p>
                </header>
                { body }
            </section>
        }
    }

    fn render_empty(message: &str) -> Html {
        html! { <p class="trend-empty">{ message }</p> }
    }

    fn render_controls(session: &Rc<RefCell<TrendSession>>, on_action: &Callback<TrendAction>) -> Html {
        html! {
            <>
                { render_category_tabs(session, on_action) }
                { render_selector(session, on_action) }
                { render_exam_filter(session, on_action) }
            </>
        }
    }

    fn render_category_tabs(session: &Rc<RefCell<TrendSession>>, on_action: &Callback<TrendAction>) -> Html {
        let session = session.borrow();
        let active = session.category().map(str::to_string);
        let tabs = std::iter::once((None, "Todas".to_string())).chain(
            session
                .categories()
                .into_iter()
                .map(|category| (Some(category.clone()), category)),
        );

        html! {
            <div class="trend-tabs" role="tablist" aria-label="Categorias">
                {
                    for tabs.map(|(category, label)| {
                        let is_active = category == active;
                        let onclick = {
                            let on_action = on_action.clone();
                            let category = category.clone();
                            Callback::from(move |_: MouseEvent| on_action.emit(TrendAction::Category(category.clone())))
                        };
                        html! {
                            <button type="button" role="tab" aria-selected={is_active.to_string()}
                                class={classes!("trend-tab", is_active.then_some("is-active"))}
                                onclick={onclick}>
                                { label }
                            </button>
                        }
                    })
                }
            </div>
        }
    }

    fn render_selector(session: &Rc<RefCell<TrendSession>>, on_action: &Callback<TrendAction>) -> Html {
        let session = session.borrow();
        let selection = session.selection();
        let metrics = session.selectable_metrics();
        if metrics.is_empty() {
            return render_empty("Nenhuma métrica nesta categoria");
        }

        html! {
            <div class="trend-selector" role="group" aria-label="Métricas exibidas">
                {
                    for metrics.iter().map(|metric| {
                        let checked = selection.is_selected(metric);
                        let color = metric_color(metric);
                        let onchange = {
                            let on_action = on_action.clone();
                            let metric = metric.clone();
                            Callback::from(move |_: Event| on_action.emit(TrendAction::ToggleMetric(metric.clone())))
                        };
                        html! {
                            <label class="trend-option">
                                <input type="checkbox" checked={checked} onchange={onchange} />
                                <span class="trend-swatch" style={format!("background: {color}")}></span>
                                { metric_display_name(metric) }
                            </label>
                        }
                    })
                }
            </div>
        }
    }

    fn render_exam_filter(session: &Rc<RefCell<TrendSession>>, on_action: &Callback<TrendAction>) -> Html {
        let session = session.borrow();

        html! {
            <div class="trend-selector trend-exams" role="group" aria-label="Exames incluídos">
                {
                    for session.exams().iter().map(|exam| {
                        let checked = session.is_exam_included(exam.id);
                        let exam_id = exam.id;
                        let onchange = {
                            let on_action = on_action.clone();
                            Callback::from(move |_: Event| on_action.emit(TrendAction::ToggleExam(exam_id)))
                        };
                        let date = date_key(exam.display_date(), session.config()).label;
                        let label = format!("{} ({date})", exam.name);
                        html! {
                            <label class="trend-option">
                                <input type="checkbox" checked={checked} onchange={onchange} />
                                { label }
                            </label>
                        }
                    })
                }
            </div>
        }
    }

    fn render_metric_infos(session: &Rc<RefCell<TrendSession>>) -> Html {
        let infos = session.borrow().selected_metric_infos();
        if infos.is_empty() {
            return Html::default();
        }

        html! {
            <section class="trend-infos">
                <h3>{"Informações sobre as métricas"}</h3>
                <div class="trend-info-grid">
                    {
                        for infos.into_iter().map(|info| {
                            let reference = info.reference_label();
                            html! {
                                <article class="trend-info" style={format!("border-left-color: {}", info.color)}>
                                    <strong style={format!("color: {}", info.color)}>{ info.label.clone() }</strong>
                                    {
                                        info.category.as_ref().map(|category| html! {
                                            <p>{"Categoria: "}<span>{ category.clone() }</span></p>
                                        }).unwrap_or_default()
                                    }
                                    {
                                        info.unit.as_ref().map(|unit| html! {
                                            <p>{"Unidade: "}<span>{ unit.clone() }</span></p>
                                        }).unwrap_or_default()
                                    }
                                    {
                                        reference.map(|range| html! {
                                            <p>{"Referência: "}<span>{ range }</span></p>
                                        }).unwrap_or_default()
                                    }
                                </article>
                            }
                        })
                    }
                </div>
            </section>
        }
    }

    fn render_plot(chart: &ChartModel, hovered: UseStateHandle<Option<usize>>) -> Html {
        let Some(layout) = ChartLayout::new(chart) else {
            return render_empty("Selecione métricas para visualizar");
        };

        let grid = layout.ticks(TICKS).into_iter().map(|value| {
            let y = format!("{:.1}", layout.y(value));
            html! {
                <g>
                    <line class="trend-grid"
                        x1={layout.plot_left().to_string()} x2={layout.plot_right().to_string()}
                        y1={y.clone()} y2={y.clone()} />
                    <text class="trend-axis-label" x={(layout.plot_left() - 8.0).to_string()} y={y}
                        text-anchor="end" dominant-baseline="middle">
                        { crate::format::format_value(value) }
                    </text>
                </g>
            }
        });

        let columns = chart.dates.iter().enumerate().map(|(row, date)| {
            let is_hovered = *hovered == Some(row);
            let onmouseenter = {
                let hovered = hovered.clone();
                Callback::from(move |_: MouseEvent| hovered.set(Some(row)))
            };
            html! {
                <g>
                    <rect class={classes!("trend-column", is_hovered.then_some("is-hovered"))}
                        x={format!("{:.1}", layout.column_left(row))}
                        y={layout.plot_top().to_string()}
                        width={format!("{:.1}", layout.column_width())}
                        height={(layout.plot_bottom() - layout.plot_top()).to_string()}
                        onmouseenter={onmouseenter} />
                    <text class="trend-axis-label" x={format!("{:.1}", layout.x(row))}
                        y={(HEIGHT - 6.0).to_string()} text-anchor="middle">
                        { date.clone() }
                    </text>
                </g>
            }
        });

        let references = chart.lines.iter().flat_map(|line| {
            [line.reference_min, line.reference_max]
                .into_iter()
                .flatten()
                .map(|bound| {
                    let y = format!("{:.1}", layout.y(bound));
                    html! {
                        <line class="trend-reference" stroke={line.color.clone()}
                            x1={layout.plot_left().to_string()} x2={layout.plot_right().to_string()}
                            y1={y.clone()} y2={y} />
                    }
                })
                .collect::<Vec<_>>()
        });

        let lines = chart.lines.iter().map(|line| {
            html! {
                <g>
                    <polyline class="trend-line" stroke={line.color.clone()} points={layout.polyline(line)} />
                    {
                        for line.points.iter().map(|point| html! {
                            <circle cx={format!("{:.1}", layout.x(point.row))}
                                cy={format!("{:.1}", layout.y(point.value))}
                                r="3.5" fill={line.color.clone()}>
                                <title>{ format!("{}: {}", line.label, value_with_unit(point.value, line.unit.as_deref())) }</title>
                            </circle>
                        })
                    }
                </g>
            }
        });

        let onmouseleave = {
            let hovered = hovered.clone();
            Callback::from(move |_: MouseEvent| hovered.set(None))
        };

        html! {
            <svg class="trend-svg" viewBox={format!("0 0 {WIDTH} {HEIGHT}")}
                role="img" aria-label="Gráfico de evolução" onmouseleave={onmouseleave}>
                { for grid }
                { for columns }
                { for references }
                { for lines }
            </svg>
        }
    }

    fn render_tooltip(session: &Rc<RefCell<TrendSession>>, hovered: Option<usize>) -> Html {
        let session = session.borrow();
        let Some(row) = hovered
            .zip(session.series())
            .and_then(|(index, series)| series.rows.get(index))
        else {
            return Html::default();
        };

        let entries = tooltip_entries(row, session.selection().selected());
        html! {
            <aside class="trend-tooltip">
                <h3>{ format!("{} · {}", row.date, row.exam_name) }</h3>
                <ul>
                    {
                        for entries.into_iter().map(|entry| html! {
                            <li>
                                <strong>{ entry.label }</strong>
                                {": "}
                                { value_with_unit(entry.value, entry.unit.as_deref()) }
                                {
                                    status_label(entry.status).map(|label| html! {
                                        <span class="trend-status" data-status={entry.status.as_str()}>
                                            { format!(" ({label})") }
                                        </span>
                                    }).unwrap_or_default()
                                }
                            </li>
                        })
                    }
                </ul>
            </aside>
        }
    }

    fn read_config(config: Option<JsValue>) -> Result<SeriesConfig, JsValue> {
        let config = match config {
            Some(value) if !value.is_undefined() && !value.is_null() => {
                from_value::<SeriesConfig>(value)?
            }
            _ => SeriesConfig::default(),
        };
        config
            .validate()
            .map_err(|err| JsValue::from_str(&format!("Configuração inválida: {err}")))?;
        Ok(config)
    }

    #[wasm_bindgen]
    pub fn mount_trend_chart(
        selector: &str,
        exams: JsValue,
        metrics: JsValue,
        config: Option<JsValue>,
    ) -> Result<(), JsValue> {
        let window: Window =
            web_sys::window().ok_or_else(|| JsValue::from_str("Janela indisponível"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("Documento indisponível"))?;

        let target: Element = document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("Seletor inválido: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("Nenhum elemento corresponde ao seletor"))?;

        let exams: Vec<Exam> = from_value(exams)?;
        let metrics: Vec<HealthMetric> = from_value(metrics)?;
        let config = read_config(config)?;

        yew::Renderer::<TrendChart>::with_root_and_props(
            target,
            TrendChartProps {
                exams,
                metrics,
                config,
            },
        )
        .render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::mount_trend_chart;

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_trend_chart(
    _: &str,
    _: wasm_bindgen::JsValue,
    _: wasm_bindgen::JsValue,
    _: Option<wasm_bindgen::JsValue>,
) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "exam-timeline-ui só pode ser compilado para wasm32",
    ))
}
