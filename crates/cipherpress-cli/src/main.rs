use anyhow::Result;
use cipherpress_config::Config;
use cipherpress_engine::{Block, Document};
use cipherpress_store::{JsonFileStore, Post, PostService};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block as UiBlock, Borders, List, ListItem, ListState, Paragraph},
};
use std::{env, io::stdout, path::PathBuf, process};

struct App {
    service: PostService<JsonFileStore>,
    posts: Vec<Post>,
    post_list_state: ListState,
    preview: Vec<String>,
    search: String,
    search_input: Option<String>,
}

impl App {
    fn new(data_path: PathBuf) -> Result<Self> {
        let store = JsonFileStore::open(data_path)?;
        let mut app = Self {
            service: PostService::new(store),
            posts: Vec::new(),
            post_list_state: ListState::default(),
            preview: Vec::new(),
            search: String::new(),
            search_input: None,
        };
        app.refresh()?;
        Ok(app)
    }

    /// Reload the post list for the current search term.
    fn refresh(&mut self) -> Result<()> {
        self.posts = if self.search.trim().is_empty() {
            self.service.all_posts()?
        } else {
            self.service.search_posts(&self.search)?
        };
        let selected = self
            .post_list_state
            .selected()
            .filter(|i| *i < self.posts.len())
            .or(if self.posts.is_empty() { None } else { Some(0) });
        self.post_list_state.select(selected);
        self.update_preview();
        Ok(())
    }

    fn next_post(&mut self) {
        if self.posts.is_empty() {
            return;
        }
        let i = match self.post_list_state.selected() {
            Some(i) => (i + 1) % self.posts.len(),
            None => 0,
        };
        self.post_list_state.select(Some(i));
        self.update_preview();
    }

    fn previous_post(&mut self) {
        if self.posts.is_empty() {
            return;
        }
        let i = match self.post_list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.posts.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.post_list_state.select(Some(i));
        self.update_preview();
    }

    fn update_preview(&mut self) {
        self.preview = match self
            .post_list_state
            .selected()
            .and_then(|i| self.posts.get(i))
        {
            Some(post) => render_post(post),
            None => Vec::new(),
        };
    }
}

/// Pretty-print a post for the preview pane.
fn render_post(post: &Post) -> Vec<String> {
    let mut lines = vec![
        post.title.clone(),
        format!(
            "by {} on {}{}",
            post.author_name,
            post.published_at.format("%Y-%m-%d"),
            post.read_time
                .map(|m| format!(" · {m} min read"))
                .unwrap_or_default(),
        ),
    ];
    if !post.tags.is_empty() {
        lines.push(format!("tags: {}", post.tags.join(", ")));
    }
    lines.push(String::new());

    let document = Document::load(&post.content);
    for block in document.blocks() {
        match block {
            Block::Heading { level, .. } => {
                let prefix = "#".repeat(level.as_u8() as usize);
                lines.push(format!("{} {}", prefix, block.text()));
                lines.push(String::new());
            }
            Block::Paragraph { .. } => {
                lines.push(block.text());
                lines.push(String::new());
            }
            Block::BulletList { items } => {
                for item in items {
                    let text: String = item.iter().map(|s| s.text.as_str()).collect();
                    lines.push(format!("• {text}"));
                }
                lines.push(String::new());
            }
            Block::OrderedList { items } => {
                for (n, item) in items.iter().enumerate() {
                    let text: String = item.iter().map(|s| s.text.as_str()).collect();
                    lines.push(format!("{}. {text}", n + 1));
                }
                lines.push(String::new());
            }
            Block::Blockquote { .. } => {
                for line in block.text().lines() {
                    lines.push(format!("> {line}"));
                }
                lines.push(String::new());
            }
            Block::CodeBlock { language, code } => {
                let lang = language.as_ref().map(|l| l.as_str()).unwrap_or("");
                lines.push(format!("```{lang}"));
                lines.extend(code.lines().map(|s| s.to_string()));
                lines.push("```".to_string());
                lines.push(String::new());
            }
            Block::Image { src } => {
                lines.push(format!("[image] {src}"));
                lines.push(String::new());
            }
        }
    }

    lines
}

fn main() -> Result<()> {
    env_logger::init();

    // Determine the data file from CLI args or the config file.
    let args: Vec<String> = env::args().collect();
    let data_path = if args.len() == 2 {
        PathBuf::from(&args[1])
    } else if args.len() == 1 {
        match Config::load() {
            Ok(Some(config)) => config.data_path,
            Ok(None) => Config::default_data_path(),
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} [posts-json-path]", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [posts-json-path]", args[0]);
        process::exit(1);
    };
    log::info!("opening post database at {}", data_path.display());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = match App::new(data_path) {
        Ok(app) => app,
        Err(e) => {
            disable_raw_mode()?;
            execute!(
                terminal.backend_mut(),
                LeaveAlternateScreen,
                DisableMouseCapture
            )?;
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    <B as ratatui::backend::Backend>::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if let Some(input) = &mut app.search_input {
                match key.code {
                    KeyCode::Esc => {
                        app.search_input = None;
                    }
                    KeyCode::Enter => {
                        app.search = app.search_input.take().unwrap_or_default();
                        app.refresh()?;
                    }
                    KeyCode::Backspace => {
                        input.pop();
                    }
                    KeyCode::Char(c) => {
                        input.push(c);
                    }
                    _ => {}
                }
                continue;
            }
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_post(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_post(),
                KeyCode::Char('/') => {
                    app.search_input = Some(app.search.clone());
                }
                KeyCode::Esc => {
                    if !app.search.is_empty() {
                        app.search.clear();
                        app.refresh()?;
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .margin(0)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(chunks[0]);

    // Post list panel
    let post_items: Vec<ListItem> = app
        .posts
        .iter()
        .map(|post| {
            let line = Line::from(vec![
                Span::raw(post.title.clone()),
                Span::styled(
                    format!("  {}", post.author_name),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            ListItem::new(vec![line])
        })
        .collect();

    let title = match (&app.search_input, app.search.is_empty()) {
        (Some(input), _) => format!("Search: {input}_"),
        (None, false) => format!("Posts ({})", app.search),
        (None, true) => "Posts".to_string(),
    };
    let post_list = List::new(post_items)
        .block(UiBlock::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(post_list, panes[0], &mut app.post_list_state);

    // Preview panel
    let preview_text = if app.preview.is_empty() {
        vec![Line::from("Select a post to read it")]
    } else {
        app.preview
            .iter()
            .map(|line| Line::from(vec![Span::raw(line.clone())]))
            .collect()
    };

    let preview = Paragraph::new(preview_text)
        .block(UiBlock::default().borders(Borders::ALL).title("Preview"))
        .wrap(ratatui::widgets::Wrap { trim: true });

    f.render_widget(preview, panes[1]);

    // Instructions
    let help = Paragraph::new(vec![Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("↑/k: Previous | "),
        Span::raw("↓/j: Next | "),
        Span::raw("/: Search | "),
        Span::raw("Esc: Clear search"),
    ])])
    .block(UiBlock::default());

    f.render_widget(help, chunks[1]);
}
